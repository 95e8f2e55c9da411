use std::fmt::Write;

use crate::knowledge::SimilarityResult;

/// Renders retrieved matches into the context block handed to the refiner.
pub fn build_context(matches: &[SimilarityResult]) -> String {
    let mut context = String::new();
    for item in matches {
        let _ = write!(
            context,
            "Question: {}\nAnswer: {}\nSimilarity: {:.4}\n\n",
            item.entry.instruction, item.entry.response, item.score
        );
    }
    context
}
