use crate::meta::Directive;

#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    Blank,
    /// A run of `-` under a table name.
    Underline,
    Directive(Directive),
    /// `#` line that is not a directive.
    Comment(&'a str),
    /// Table name or field declaration; which one is decided by the parser.
    Text(&'a str),
}

pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn classify(line: &'a str) -> Line<'a> {
        let line = line.trim();
        if line.is_empty() {
            Line::Blank
        } else if line.chars().all(|c| c == '-') {
            Line::Underline
        } else if line.starts_with('#') {
            match Directive::parse_line(line) {
                Some(d) => Line::Directive(d),
                None => Line::Comment(line),
            }
        } else {
            Line::Text(line)
        }
    }

    pub fn tokenize(self) -> Vec<Line<'a>> {
        self.input.lines().map(Self::classify).collect()
    }
}

/// Split a declaration into its body and the trailing `# comment`, if any.
/// A `#` inside quotes or parentheses does not start a comment.
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut scan = Scanner::default();
    for (idx, c) in line.char_indices() {
        if c == '#' && scan.at_top() {
            let comment = line[idx + 1..].trim();
            let comment = (!comment.is_empty()).then_some(comment);
            return (line[..idx].trim_end(), comment);
        }
        scan.feed(c);
    }
    (line, None)
}

/// Whitespace-separated words. Quoted and parenthesised groups such as
/// `enum('a b', 'c')` stay one word.
pub fn split_words(line: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut scan = Scanner::default();

    for (idx, c) in line.char_indices() {
        if c.is_whitespace() && scan.at_top() {
            if let Some(s) = start.take() {
                words.push(&line[s..idx]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(idx);
        }
        scan.feed(c);
    }
    if let Some(s) = start {
        words.push(&line[s..]);
    }
    words
}

/// Tracks quote and parenthesis nesting while walking a line.
#[derive(Default)]
struct Scanner {
    quote: Option<char>,
    depth: usize,
}

impl Scanner {
    fn at_top(&self) -> bool {
        self.quote.is_none() && self.depth == 0
    }

    fn feed(&mut self, c: char) {
        match (self.quote, c) {
            (Some(q), c) if c == q => self.quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => self.quote = Some(c),
            (None, '(') => self.depth += 1,
            (None, ')') => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        let input = "user\n----\n\n  id pk\n# zoom: 1.000\n# a note\n-";
        let lines = Lexer::new(input).tokenize();
        assert_eq!(
            lines,
            vec![
                Line::Text("user"),
                Line::Underline,
                Line::Blank,
                Line::Text("id pk"),
                Line::Directive(Directive::Zoom(1.0)),
                Line::Comment("# a note"),
                Line::Underline,
            ]
        );
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split_comment("post_id fk # e.g."), ("post_id fk", Some("e.g.")));
        assert_eq!(split_comment("id pk"), ("id pk", None));
        assert_eq!(split_comment("id pk #"), ("id pk", None));
        assert_eq!(
            split_comment("color default '#fff' # hex"),
            ("color default '#fff'", Some("hex"))
        );
    }

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words("status enum('a b', 'c')  null"),
            vec!["status", "enum('a b', 'c')", "null"]
        );
        assert_eq!(split_words("  "), Vec::<&str>::new());
        assert_eq!(
            split_words("author_id fk >- user.id"),
            vec!["author_id", "fk", ">-", "user.id"]
        );
    }

    #[test]
    fn test_unicode_words() {
        assert_eq!(split_words("名前 文字列"), vec!["名前", "文字列"]);
    }
}
