//! Prompt templates for the three generation modes.
//!
//! Templates use `{placeholder}` slots filled by simple `.replace` calls in
//! `llm_client::build_prompt`. The model is asked for page markup only —
//! simple `<p>` paragraphs — because the produced text re-enters the same
//! reflow path as a paste and must measure like page content.

pub const SHARED_OUTPUT_RULES: &str = "\
Output rules:
- Return ONLY the prose for the page as simple HTML paragraphs (<p>…</p>).
- No headings, no lists, no code fences, no commentary about the task.
- Stay close to the word budget; going far over it spills onto later pages.";

pub const NEW_SYSTEM: &str = "\
You are a fiction co-writer drafting a fresh page of a book chapter. Match \
the narrative voice suggested by the context and write vivid, concrete \
prose. Never summarize or explain — write the page itself.";

pub const NEW_PROMPT_TEMPLATE: &str = "\
Chapter: {chapter_title}
Page: {page_number}

End of the previous page (context, do not repeat it):
---
{previous_tail}
---

Author instructions: {instructions}

Write the next page from scratch. Target about {word_budget} words.

{output_rules}";

pub const CONTINUE_SYSTEM: &str = "\
You are a fiction co-writer continuing a page the author has already \
started. Pick up exactly where the existing text stops — same scene, same \
tense, same voice — without repeating or rephrasing any of it.";

pub const CONTINUE_PROMPT_TEMPLATE: &str = "\
Chapter: {chapter_title}
Page: {page_number}

End of the previous page (context, do not repeat it):
---
{previous_tail}
---

Text already on this page (continue after it, do not repeat it):
---
{page_content}
---

Author instructions: {instructions}

Continue the page. Target about {word_budget} words of new text.

{output_rules}";

pub const REWRITE_SYSTEM: &str = "\
You are a fiction line editor. Rewrite the given page to be tighter and \
more vivid while preserving its plot beats, characters, and approximate \
length. Do not introduce new story events.";

pub const REWRITE_PROMPT_TEMPLATE: &str = "\
Chapter: {chapter_title}
Page: {page_number}

End of the previous page (context for continuity):
---
{previous_tail}
---

Current page text to rewrite:
---
{page_content}
---

Author instructions: {instructions}

Rewrite this page. Target about {word_budget} words.

{output_rules}";
