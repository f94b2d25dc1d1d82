use serde::Serialize;

const AVG_INPUT_TOKENS_PER_CALL: u64 = 500;
const AVG_OUTPUT_TOKENS_PER_CALL: u64 = 200;
/// USD per million tokens.
const INPUT_PRICE_PER_MILLION: f64 = 3.0;
const OUTPUT_PRICE_PER_MILLION: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditEstimate {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub estimated_cost: String,
}

/// Rough spend for grading `questions` answers with live feedback.
pub fn estimate_api_credits(questions: u64) -> CreditEstimate {
    let input_tokens = questions * AVG_INPUT_TOKENS_PER_CALL;
    let output_tokens = questions * AVG_OUTPUT_TOKENS_PER_CALL;

    let cost = input_tokens as f64 / 1_000_000.0 * INPUT_PRICE_PER_MILLION
        + output_tokens as f64 / 1_000_000.0 * OUTPUT_PRICE_PER_MILLION;

    CreditEstimate {
        input_tokens,
        output_tokens,
        estimated_cost: format!("${cost:.4} ({questions} questions)"),
    }
}
