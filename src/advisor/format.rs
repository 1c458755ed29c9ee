//! Render the advisor's line-oriented markup as HTML fragments.
//!
//! | line                    | output                     |
//! |-------------------------|----------------------------|
//! | `- **Title:**`          | `<strong>Title:</strong>`  |
//! | `* - item`              | `<ul><li>item</li>`        |
//! | `1. item`               | `<ol><li>item</li>`        |
//! | anything else           | `<p>line</p>`              |

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    fn open(self) -> &'static str {
        match self {
            ListKind::Bulleted => "<ul>",
            ListKind::Numbered => "<ol>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            ListKind::Bulleted => "</ul>",
            ListKind::Numbered => "</ol>",
        }
    }
}

fn is_numbered(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && line.as_bytes().get(digits) == Some(&b'.')
}

fn enter_list(html: &mut String, open_list: &mut Option<ListKind>, kind: ListKind) {
    if *open_list != Some(kind) {
        if let Some(current) = open_list.take() {
            html.push_str(current.close());
        }
        html.push_str(kind.open());
        *open_list = Some(kind);
    }
}

fn section_title(line: &str) -> &str {
    let body = &line[4..];
    let title = if line.ends_with(":**") {
        body.rfind(":**").map_or(body, |end| &body[..end])
    } else {
        body
    };
    title.trim()
}

pub fn to_html(text: &str) -> String {
    if text.trim().is_empty() {
        return "<p>Error: Invalid response format.</p>".to_string();
    }

    let mut html = String::new();
    let mut open_list: Option<ListKind> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("- **") {
            if let Some(current) = open_list.take() {
                html.push_str(current.close());
            }
            html.push_str(&format!("<strong>{}:</strong>", section_title(line)));
        } else if line.starts_with("* - ") {
            enter_list(&mut html, &mut open_list, ListKind::Bulleted);
            html.push_str(&format!("<li>{}</li>", line.replace("* - ", "").trim()));
        } else if is_numbered(line) {
            enter_list(&mut html, &mut open_list, ListKind::Numbered);
            let item = line.split_once(' ').map_or(line, |(_, rest)| rest);
            html.push_str(&format!("<li>{}</li>", item.trim()));
        } else {
            if let Some(current) = open_list.take() {
                html.push_str(current.close());
            }
            html.push_str(&format!("<p>{line}</p>"));
        }
    }

    if let Some(current) = open_list {
        html.push_str(current.close());
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(to_html(""), "<p>Error: Invalid response format.</p>");
        assert_eq!(to_html("  \n "), "<p>Error: Invalid response format.</p>");
    }

    #[test]
    fn test_paragraphs_and_sections() {
        let html = to_html("Hi Asha!\n\n- **Eligibility Criteria:**\n* - Age: 18-70 years\n* - Income: stable");
        assert_eq!(
            html,
            "<p>Hi Asha!</p><strong>Eligibility Criteria:</strong><ul><li>Age: 18-70 years</li><li>Income: stable</li></ul>"
        );
    }

    #[test]
    fn test_switching_list_kinds_closes_previous() {
        let html = to_html("* - bullet\n1. first\n2. second\n* - again");
        assert_eq!(
            html,
            "<ul><li>bullet</li></ul><ol><li>first</li><li>second</li></ol><ul><li>again</li></ul>"
        );
    }

    #[test]
    fn test_section_closes_open_list() {
        let html = to_html("1. Income proof\n- **Next Steps:**\nVisit a branch.");
        assert_eq!(
            html,
            "<ol><li>Income proof</li></ol><strong>Next Steps:</strong><p>Visit a branch.</p>"
        );
    }

    #[test]
    fn test_numbered_line_without_space_keeps_text() {
        assert_eq!(to_html("12.Done"), "<ol><li>12.Done</li></ol>");
        assert!(!is_numbered("v1.2 release"));
        assert!(!is_numbered(".5 percent"));
    }

    #[test]
    fn test_section_without_trailing_marker() {
        assert_eq!(section_title("- **Loan Details"), "Loan Details");
        assert_eq!(section_title("- **Loan Details:**"), "Loan Details");
    }
}
