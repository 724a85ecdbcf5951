//! # 媒体标题
//!
//! `@System Name/Game Title?adv=args`

use crate::command::AdvArgs;
use crate::error::ParseError;

use super::arguments::{adv_args_from, scan_adv_args};
use super::cursor::Cursor;
use super::helpers::{Scanned, check_end_of_cmd, push_escape};
use super::symbols::{ADV_ARG_START, ESCAPE, MEDIA_TITLE_SEP};

/// 扫描到的媒体标题段
#[derive(Debug)]
pub(crate) struct MediaTitle {
    /// 去除首尾空白后的内容（不含 `@`）
    pub(crate) content: String,
    pub(crate) adv_args: AdvArgs,
}

impl MediaTitle {
    /// 内容必须是 `system/title`，且两部分去空白后都非空
    pub(crate) fn is_valid(&self) -> bool {
        self.content
            .split_once(MEDIA_TITLE_SEP)
            .is_some_and(|(system, title)| !system.trim().is_empty() && !title.trim().is_empty())
    }
}

/// 扫描媒体标题（`@` 已消费）
pub(crate) fn scan_media_title(cursor: &mut Cursor<'_>) -> Result<MediaTitle, ParseError> {
    let mut content = String::new();
    let mut adv_args = AdvArgs::default();

    while let Some(ch) = cursor.read() {
        if ch == ESCAPE {
            push_escape(cursor, &mut content);
            continue;
        }

        if check_end_of_cmd(cursor, ch) {
            break;
        }

        if ch == ADV_ARG_START {
            match scan_adv_args(cursor)? {
                Scanned::Value(map) => {
                    adv_args = adv_args_from(map);
                    break;
                }
                Scanned::Literal(raw) => {
                    content.push(ADV_ARG_START);
                    content.push_str(&raw);
                    continue;
                }
            }
        }

        content.push(ch);
    }

    Ok(MediaTitle {
        content: content.trim().to_string(),
        adv_args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> MediaTitle {
        scan_media_title(&mut Cursor::new(input)).unwrap()
    }

    #[test]
    fn test_valid_titles() {
        let title = scan("snes/Super Mario World");
        assert!(title.is_valid());
        assert_eq!(title.content, "snes/Super Mario World");

        let title = scan("  Nintendo 64 / Zelda (USA)  ");
        assert!(title.is_valid());
        assert_eq!(title.content, "Nintendo 64 / Zelda (USA)");

        // 只看第一个 `/`
        assert!(scan("pc/Half/Life").is_valid());
    }

    #[test]
    fn test_invalid_titles() {
        assert!(!scan("snes").is_valid());
        assert!(!scan("/title").is_valid());
        assert!(!scan("snes/").is_valid());
        assert!(!scan(" / ").is_valid());
        assert!(!scan("").is_valid());
    }

    #[test]
    fn test_adv_args_and_fallback() {
        let title = scan("snes/Mario?launcher=retroarch");
        assert_eq!(title.content, "snes/Mario");
        assert_eq!(title.adv_args.get("launcher"), Some("retroarch"));

        let title = scan("pc/Who? Me");
        assert_eq!(title.content, "pc/Who? Me");
        assert!(title.adv_args.raw().is_none());
    }

    #[test]
    fn test_escapes_and_terminator() {
        let mut cursor = Cursor::new("snes/A^^B|C||**next");
        let title = scan_media_title(&mut cursor).unwrap();
        assert_eq!(title.content, "snes/A^B|C");
        assert_eq!(cursor.peek(), Some('*'));
    }
}
