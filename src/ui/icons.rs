//! Shared UI icons.

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static PROGRESS: Emoji<'_, '_> = Emoji("📊 ", "[PROG]");
pub static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[>]");
pub static QUESTION: Emoji<'_, '_> = Emoji("💬 ", "[?]");
pub static ARROW: Emoji<'_, '_> = Emoji("→ ", "-> ");
