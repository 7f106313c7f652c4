pub const SECTION_SEPARATOR: &str = "---";

/// One named block of an NPC data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub hidden: bool,
    pub body: String,
}

/// Splits NPC text on `---`. The first line of each block names it; a `?`
/// prefix marks the section hidden. A later section replaces an earlier one
/// with the same name.
pub fn split_sections(text: &str) -> Vec<Section> {
    let normalized = text.replace("\r\n", "\n");
    let mut sections: Vec<Section> = Vec::new();
    for block in normalized.split(SECTION_SEPARATOR) {
        let block = block.trim();
        let (header, body) = block.split_once('\n').unwrap_or((block, ""));
        let header = header.trim();
        if header.is_empty() {
            continue;
        }
        let (name, hidden) = match header.strip_prefix('?') {
            Some(name) => (name.trim(), true),
            None => (header, false),
        };
        if name.is_empty() {
            continue;
        }
        let section = Section {
            name: name.to_string(),
            hidden,
            body: body.trim().to_string(),
        };
        match sections.iter_mut().find(|existing| existing.name == section.name) {
            Some(existing) => *existing = section,
            None => sections.push(section),
        }
    }
    sections
}

pub fn has_section(text: &str, name: &str) -> bool {
    split_sections(text).iter().any(|section| section.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MERCHANT: &str = "\
Look
A stout merchant behind a counter.
---
Greet
Welcome, ${playerName}!
---
?Whisper
Psst.
---
Buy
weapon/sword/1/IronSword/5
";

    #[test]
    fn sections_are_named_by_their_first_line() {
        let sections = split_sections(MERCHANT);
        let names: Vec<&str> = sections.iter().map(|section| section.name.as_str()).collect();
        assert_eq!(names, vec!["Look", "Greet", "Whisper", "Buy"]);
        assert_eq!(sections[0].body, "A stout merchant behind a counter.");
        assert_eq!(sections[3].body, "weapon/sword/1/IronSword/5");
    }

    #[test]
    fn question_mark_hides_the_section() {
        let sections = split_sections(MERCHANT);
        assert!(sections[2].hidden);
        assert!(!sections[1].hidden);
        assert!(has_section(MERCHANT, "Whisper"));
        assert!(!has_section(MERCHANT, "?Whisper"));
    }

    #[test]
    fn empty_blocks_and_header_only_sections() {
        let sections = split_sections("---\n\n---\nWave\n---");
        assert_eq!(
            sections,
            vec![Section {
                name: "Wave".to_string(),
                hidden: false,
                body: String::new(),
            }]
        );
    }

    #[test]
    fn later_sections_replace_earlier_ones() {
        let sections = split_sections("Look\nfirst\n---\nLook\nsecond");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "second");
    }
}
