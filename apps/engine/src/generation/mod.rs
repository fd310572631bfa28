// Generation integration: mode preconditions, merge rules, and request
// assembly. The async orchestration lives in the session (it owns the
// single-writer lock); every provider round trip goes through the
// GenerationProvider seam — no model API calls anywhere else.

pub mod merge;
pub mod provider;

pub use merge::{check_precondition, merge_generated};
pub use provider::{GenerationMode, GenerationProvider, GenerationRequest};

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::pagination::capacity::{effective_length, strip_markup};
use crate::pagination::state::PaginationState;

/// Rough characters per word, used to turn remaining page capacity into the
/// word-budget hint handed to the provider.
const CHARS_PER_WORD: usize = 6;
/// Never ask the provider for fewer words than this.
const MIN_WORD_BUDGET: usize = 40;

/// Identifies one in-flight generation. A result is merged only while its
/// ticket is still the session's current one; cancellation simply retires
/// the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    pub id: Uuid,
    pub page_number: u32,
}

impl GenerationTicket {
    pub fn new(page_number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_number,
        }
    }
}

/// Assembles the provider request for generating into `page_number` of the
/// given state. Precondition checks have already passed.
pub fn build_request(
    state: &PaginationState,
    chapter_title: &str,
    mode: GenerationMode,
    page_number: u32,
    instructions: Option<String>,
    config: &EngineConfig,
) -> GenerationRequest {
    let page_content = state
        .page(page_number)
        .map(|p| p.content().to_string())
        .unwrap_or_default();

    let previous_tail = if page_number > 1 {
        state
            .page(page_number - 1)
            .map(|p| stripped_tail(p.content(), config.previous_tail_chars))
            .unwrap_or_default()
    } else {
        String::new()
    };

    GenerationRequest {
        chapter_id: state.chapter_id(),
        chapter_title: chapter_title.to_string(),
        mode,
        page_number,
        previous_tail,
        word_budget: word_budget(mode, &page_content, state.profile().capacity),
        page_content,
        instructions,
    }
}

/// Word budget from the capacity left on the page. `Rewrite` keeps roughly
/// the page's current extent; the other modes fill what remains.
fn word_budget(mode: GenerationMode, page_content: &str, capacity: usize) -> usize {
    let budget_chars = match mode {
        GenerationMode::Rewrite => effective_length(page_content).max(MIN_WORD_BUDGET * CHARS_PER_WORD),
        GenerationMode::New => capacity,
        GenerationMode::Continue => capacity.saturating_sub(effective_length(page_content)),
    };
    (budget_chars / CHARS_PER_WORD).max(MIN_WORD_BUDGET)
}

fn stripped_tail(content: &str, max_chars: usize) -> String {
    let stripped = strip_markup(content);
    let chars: Vec<char> = stripped.chars().collect();
    if chars.len() <= max_chars {
        return stripped;
    }
    chars[chars.len() - max_chars..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::paper::PaperSize;

    fn make_state(body: &str) -> PaginationState {
        PaginationState::open(Uuid::new_v4(), body, PaperSize::Novel, &EngineConfig::default())
    }

    #[test]
    fn test_build_request_first_page_has_no_previous_tail() {
        let state = make_state("some text");
        let request = build_request(
            &state,
            "Chapter One",
            GenerationMode::Continue,
            1,
            None,
            &EngineConfig::default(),
        );
        assert_eq!(request.previous_tail, "");
        assert_eq!(request.page_content, "some text");
        assert_eq!(request.chapter_title, "Chapter One");
    }

    #[test]
    fn test_build_request_includes_previous_page_tail() {
        let config = EngineConfig::default();
        let mut state = make_state("");
        state
            .edit_page(1, "x".repeat(state.profile().capacity + 20), &config)
            .unwrap();
        assert_eq!(state.total_pages(), 2);

        let request = build_request(&state, "Ch", GenerationMode::Continue, 2, None, &config);

        assert_eq!(request.previous_tail.len(), config.previous_tail_chars);
        assert!(request.previous_tail.chars().all(|c| c == 'x'));
    }

    #[test]
    fn test_previous_tail_strips_markup() {
        let config = EngineConfig::default();
        let mut state = make_state("");
        state
            .edit_page(1, "<p>short page</p>".to_string(), &config)
            .unwrap();
        state.navigate_to(2, &config).unwrap();

        let request = build_request(&state, "Ch", GenerationMode::New, 2, None, &config);
        assert_eq!(request.previous_tail, "short page");
    }

    #[test]
    fn test_word_budget_shrinks_as_page_fills() {
        let capacity = 1_500;
        let empty = word_budget(GenerationMode::New, "", capacity);
        let half = word_budget(GenerationMode::Continue, &"a".repeat(750), capacity);
        let full = word_budget(GenerationMode::Continue, &"a".repeat(1_490), capacity);
        assert!(empty > half);
        assert!(half > full);
        assert!(full >= MIN_WORD_BUDGET, "budget never drops below the floor");
    }

    #[test]
    fn test_ticket_ids_are_unique() {
        let a = GenerationTicket::new(1);
        let b = GenerationTicket::new(1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.page_number, b.page_number);
    }
}
