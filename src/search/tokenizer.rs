/// Splits free text into search terms on whitespace.
///
/// No case folding and no length filter: each term is matched as a
/// substring by the store. Duplicates are kept.
pub fn split_terms(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
