//! Prompt templates for outline, chapter and summary requests.
//!
//! Template text is plain data with `{name}` slots. Each task has a typed
//! parameter record that supplies the slot values at render time.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Substituted for absent descriptions and empty summaries.
pub const NOT_SUPPLIED: &str = "not supplied";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

pub const OUTLINE: PromptTemplate = PromptTemplate {
    system: "Create a list of {number} chapters for an ebook. Include an introductory and a \
concluding chapter, and give the introduction and conclusion interesting names instead of \
calling them Introduction or Conclusion. Respond only with the chapter names separated by \
commas on a single line. Don't include numbering or the word 'chapter'.\n\
The book has a title and an optional description.\n\
Output Format: Chapter 1 Name, Chapter 2 Name, ...",
    user: "Book Title: {title}, Book Description: {description}",
};

pub const FIRST_CHAPTER: PromptTemplate = PromptTemplate {
    system: "You are writing the first chapter of an ebook. Make this first chapter interesting \
to encourage the reader to read on. Write about {number_of_words} words.\n\n\
BOOK NAME: {book_name}\n\
BOOK DESCRIPTION: {book_description}\n\
SUMMARY SO FAR: {summary_so_far}",
    user: "CHAPTER NUMBER: {chapter_number}\nCHAPTER NAME: {chapter_name}",
};

pub const NEXT_CHAPTER: PromptTemplate = PromptTemplate {
    system: "You are writing a chapter of an ebook. Write about {number_of_words} words.\n\
Use the previous chapter summaries provided to keep a consistent narrative, and make this \
chapter follow on naturally from the previous chapter ({previous_chapter}) described in the \
summary below.\n\
Don't mention the present or previous chapters by name or number.\n\n\
BOOK NAME: {book_name}\n\
BOOK DESCRIPTION: {book_description}\n\
SUMMARY SO FAR: {summary_so_far}",
    user: "CHAPTER NUMBER: {chapter_number}\nCHAPTER NAME: {chapter_name}",
};

pub const SUMMARY: PromptTemplate = PromptTemplate {
    system: "You are writing a {number_of_words} word summary of an ebook chapter, \
including its key themes and ideas:",
    user: "Book Chapter: {input}",
};

/// Supplies values for a template's `{name}` slots.
pub trait TemplateParams {
    fn value(&self, name: &str) -> Option<String>;
}

impl PromptTemplate {
    /// Fills every known slot. Unknown slots are left as written.
    pub fn render(&self, params: &impl TemplateParams) -> RenderedPrompt {
        RenderedPrompt {
            system: fill(self.system, params),
            user: fill(self.user, params),
        }
    }
}

fn fill(text: &str, params: &impl TemplateParams) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            params
                .value(&caps[1])
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn or_not_supplied(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(NOT_SUPPLIED)
        .to_string()
}

pub struct OutlineParams<'a> {
    pub chapter_count: usize,
    pub title: &'a str,
    pub description: Option<&'a str>,
}

impl TemplateParams for OutlineParams<'_> {
    fn value(&self, name: &str) -> Option<String> {
        match name {
            "number" => Some(self.chapter_count.to_string()),
            "title" => Some(self.title.to_string()),
            "description" => Some(or_not_supplied(self.description)),
            _ => None,
        }
    }
}

pub struct ChapterParams<'a> {
    pub book_title: &'a str,
    pub book_description: Option<&'a str>,
    pub chapter_index: usize,
    pub chapter_name: &'a str,
    pub summary_so_far: &'a str,
    pub words_per_chapter: u32,
}

impl ChapterParams<'_> {
    pub fn template(&self) -> PromptTemplate {
        if self.chapter_index == 1 {
            FIRST_CHAPTER
        } else {
            NEXT_CHAPTER
        }
    }

    pub fn render(&self) -> RenderedPrompt {
        self.template().render(self)
    }
}

impl TemplateParams for ChapterParams<'_> {
    fn value(&self, name: &str) -> Option<String> {
        match name {
            "book_name" => Some(self.book_title.to_string()),
            "book_description" => Some(or_not_supplied(self.book_description)),
            "summary_so_far" => Some(or_not_supplied(Some(self.summary_so_far))),
            "chapter_number" => Some(self.chapter_index.to_string()),
            "previous_chapter" => Some(self.chapter_index.saturating_sub(1).to_string()),
            "chapter_name" => Some(self.chapter_name.to_string()),
            "number_of_words" => Some(self.words_per_chapter.to_string()),
            _ => None,
        }
    }
}

pub struct SummaryParams<'a> {
    pub input: &'a str,
    pub target_words: u32,
}

impl TemplateParams for SummaryParams<'_> {
    fn value(&self, name: &str) -> Option<String> {
        match name {
            "input" => Some(self.input.to_string()),
            "number_of_words" => Some(self.target_words.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(index: usize, summary: &str) -> ChapterParams<'_> {
        ChapterParams {
            book_title: "Atlas",
            book_description: None,
            chapter_index: index,
            chapter_name: "Horizon",
            summary_so_far: summary,
            words_per_chapter: 350,
        }
    }

    #[test]
    fn outline_prompt_carries_count_and_placeholder_description() {
        let prompt = OUTLINE.render(&OutlineParams {
            chapter_count: 7,
            title: "Atlas",
            description: Some(""),
        });
        assert!(prompt.system.starts_with("Create a list of 7 chapters"));
        assert_eq!(
            prompt.user,
            "Book Title: Atlas, Book Description: not supplied"
        );
    }

    #[test]
    fn first_chapter_uses_opening_template() {
        let prompt = chapter(1, "").render();
        assert!(prompt.system.starts_with("You are writing the first chapter"));
        assert!(prompt.system.contains("SUMMARY SO FAR: not supplied"));
        assert!(prompt.system.contains("about 350 words"));
    }

    #[test]
    fn later_chapters_continue_from_the_summary() {
        let prompt = chapter(3, "Chapter 1 Summary: dawn\n\nChapter 2 Summary: noon\n\n").render();
        assert!(prompt.system.contains("previous chapter (2)"));
        assert!(prompt.system.contains("Don't mention the present or previous chapters"));
        assert!(prompt.system.contains("Chapter 2 Summary: noon"));
        assert_eq!(prompt.user, "CHAPTER NUMBER: 3\nCHAPTER NAME: Horizon");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let prompt = SUMMARY.render(&SummaryParams {
            input: "braces {number_of_words} stay literal",
            target_words: 60,
        });
        assert!(prompt.system.contains("a 60 word summary"));
        assert_eq!(
            prompt.user,
            "Book Chapter: braces {number_of_words} stay literal"
        );
    }

    #[test]
    fn unknown_placeholders_are_left_verbatim() {
        let template = PromptTemplate {
            system: "{title} and {mystery}",
            user: "",
        };
        let prompt = template.render(&OutlineParams {
            chapter_count: 1,
            title: "Atlas",
            description: None,
        });
        assert_eq!(prompt.system, "Atlas and {mystery}");
    }
}
