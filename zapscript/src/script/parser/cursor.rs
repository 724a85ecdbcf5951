//! # 字符游标
//!
//! 对不可变输入的单向扫描，支持一个字符的回退。

/// 字符游标
///
/// - `pos` 是已消费的字符数（Unicode 码点），用于错误偏移
/// - `byte` 是对应的字节偏移，用于截取原始文本
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    byte: usize,
    pos: usize,
    /// 最近一次 `read` 读到的字符（读到末尾时为 `None`）
    last: Option<char>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            byte: 0,
            pos: 0,
            last: None,
        }
    }

    /// 读取下一个字符，末尾返回 `None`
    pub(crate) fn read(&mut self) -> Option<char> {
        let ch = self.input[self.byte..].chars().next();
        if let Some(c) = ch {
            self.byte += c.len_utf8();
            self.pos += 1;
        }
        self.last = ch;
        ch
    }

    /// 查看下一个字符但不消费
    pub(crate) fn peek(&self) -> Option<char> {
        self.input[self.byte..].chars().next()
    }

    /// 已消费的最后一个字符（不受 `unread` 缓冲影响）
    pub(crate) fn prev(&self) -> Option<char> {
        self.input[..self.byte].chars().next_back()
    }

    /// 回退刚刚读到的字符
    ///
    /// 只能紧跟在 `read` 之后调用一次；上次读到末尾时什么也不做。
    pub(crate) fn unread(&mut self) {
        if let Some(c) = self.last.take() {
            self.byte -= c.len_utf8();
            self.pos -= 1;
        }
    }

    /// 消费并丢弃一个字符
    pub(crate) fn skip(&mut self) {
        self.read();
    }

    /// 已消费的字符数
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// 当前字节偏移，配合 [`Cursor::slice_from`] 截取原始文本
    pub(crate) fn mark(&self) -> usize {
        self.byte
    }

    /// 从 `mark` 到当前位置的原始文本
    pub(crate) fn slice_from(&self, mark: usize) -> &'a str {
        &self.input[mark.min(self.byte)..self.byte]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_peek_unread() {
        let mut cursor = Cursor::new("aé");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.prev(), None);
        assert_eq!(cursor.read(), Some('a'));
        assert_eq!(cursor.prev(), Some('a'));
        assert_eq!(cursor.read(), Some('é'));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.mark(), 3);

        cursor.unread();
        assert_eq!(cursor.pos(), 1);
        assert_eq!(cursor.peek(), Some('é'));
        assert_eq!(cursor.prev(), Some('a'));

        // 只能回退一次
        cursor.unread();
        assert_eq!(cursor.pos(), 1);
    }

    #[test]
    fn test_eof_is_not_error() {
        let mut cursor = Cursor::new("x");
        cursor.skip();
        assert_eq!(cursor.read(), None);
        assert_eq!(cursor.read(), None);
        assert_eq!(cursor.peek(), None);

        // 读到末尾后回退无效果
        cursor.unread();
        assert_eq!(cursor.pos(), 1);
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn test_slice_from() {
        let mut cursor = Cursor::new("ab|cd");
        cursor.skip();
        let mark = cursor.mark();
        cursor.skip();
        cursor.skip();
        assert_eq!(cursor.slice_from(mark), "b|");
    }
}
