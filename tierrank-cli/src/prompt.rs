/// Prompt building for LLM-answered comparisons.

/// Build a comparison prompt for two titles from the same tier.
///
/// The model writes a short analysis, then "Verdict:" followed by A or B, which
/// `parse::parse_verdict` extracts.
pub fn build_prompt(criterion: &str, category: &str, option_a: &str, option_b: &str) -> String {
    format!(
        "Both of these titles are on my \"{category}\" list.\n\
         {criterion}\n\n\
         Option A:\n{option_a}\n\n\
         Option B:\n{option_b}\n\n\
         Instructions:\n\
         Briefly compare the two in two or three sentences. \
         Then write \"Verdict:\" on its own line, followed by exactly one letter:\n\n\
         A: Option A ranks higher\n\
         B: Option B ranks higher\n"
    )
}
