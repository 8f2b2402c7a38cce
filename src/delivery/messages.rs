//! User-facing chat texts.

use crate::pipeline::Article;
use crate::util::escape_html;

pub const WELCOME: &str = "Привет! Я бот, который предоставляет RSS-ленту статей с Хабра по теме информационной безопасности.\n\nДоступные команды:\n/infosec или /security - получить последние статьи по информационной безопасности";

pub const HELP: &str = "Доступные команды:\n/infosec или /security - получить последние статьи по информационной безопасности\n/help - показать это сообщение\n/start - начать работу с ботом";

pub const LOADING: &str =
    "Получаю последние статьи по информационной безопасности с Хабра...";

pub const FETCH_FAILED: &str =
    "Ошибка при получении статей. Пожалуйста, попробуйте позже.";

pub const NO_NEW_ARTICLES: &str =
    "На данный момент нет новых статей по информационной безопасности.";

/// Renders one article as a Telegram HTML message.
///
/// Title, summary and link are all escaped; the link lands inside an
/// attribute value.
pub fn format_article(article: &Article) -> String {
    format!(
        "📚 <b>{}</b>\n\n{}\n\n🔗 <a href=\"{}\">Читать на Хабре</a>",
        escape_html(&article.title),
        escape_html(&article.summary),
        escape_html(&article.link),
    )
}
