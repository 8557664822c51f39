use std::cmp::Ordering;

/// One entry in a directory listing.
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Generates HTML directory listings for GET on a collection.
pub struct DirectoryLister<'a> {
    css: &'a [String],
    javascript: &'a [String],
    class_directory: &'a str,
    div_id: Option<&'a str>,
}

impl<'a> DirectoryLister<'a> {
    pub fn new(css: &'a [String], javascript: &'a [String], class_directory: &'a str, div_id: Option<&'a str>) -> Self {
        DirectoryLister { css, javascript, class_directory, div_id }
    }

    /// Build the HTML body. `path_title` is the filesystem path being
    /// listed, shown as `<title>`. `entries` does not need to include `..`
    /// or `.` (those are handled here), and callers may pass the raw
    /// `read_dir` listing since dotfiles are filtered out here too.
    pub fn render(&self, path_title: &str, entries: &[ListingEntry]) -> String {
        let mut visible: Vec<&ListingEntry> = entries
            .iter()
            .filter(|e| !e.name.starts_with('.'))
            .collect();
        visible.sort_by(|a, b| natural_cmp(&a.name, &b.name));

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str(&format!("<title>{}</title>\n", escape_html(path_title)));
        for css in self.css {
            html.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">\n", escape_html(css)));
        }
        for js in self.javascript {
            html.push_str(&format!("<script src=\"{}\"></script>\n", escape_html(js)));
        }
        html.push_str("</head>\n<body>\n");

        match self.div_id {
            Some(id) => html.push_str(&format!("<div id=\"{}\">\n<ul>\n", escape_html(id))),
            None => html.push_str("<div>\n<ul>\n"),
        }

        html.push_str(&format!("<li class=\"{}\"><a href=\"../\">..</a></li>\n", escape_html(self.class_directory)));

        for entry in visible {
            let href = if entry.is_dir { format!("{}/", entry.name) } else { entry.name.clone() };
            if entry.is_dir {
                html.push_str(&format!(
                    "<li class=\"{}\"><a href=\"{}\">{}</a></li>\n",
                    escape_html(self.class_directory),
                    escape_html(&href),
                    escape_html(&entry.name)
                ));
            } else {
                html.push_str(&format!(
                    "<li><a href=\"{}\">{}</a></li>\n",
                    escape_html(&href),
                    escape_html(&entry.name)
                ));
            }
        }

        html.push_str("</ul>\n</div>\n</body>\n</html>\n");
        html
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Lexicographic comparison with natural-number awareness: runs of ASCII
/// digits compare by numeric value rather than character-by-character, so
/// `file2` sorts before `file10`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek(), bi.peek()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&ca), Some(&cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let na = take_number(&mut ai);
                    let nb = take_number(&mut bi);
                    match na.cmp(&nb) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                } else {
                    match ca.cmp(&cb) {
                        Ordering::Equal => {
                            ai.next();
                            bi.next();
                            continue;
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(it: &mut std::iter::Peekable<std::str::Chars>) -> u64 {
    let mut n: u64 = 0;
    while let Some(&c) = it.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        n = n.saturating_mul(10).saturating_add(c.to_digit(10).unwrap() as u64);
        it.next();
    }
    n
}
