use crate::domain::{GradeResult, GradingSample};
use crate::error::{AppError, GRADING_PARSE_FAILED};

pub fn grading_prompt(sample: &GradingSample) -> String {
    // Contract with the grader:
    // - Judge only against the reference block and golden answer.
    // - Reply with a single JSON object {"reasoning": ..., "score": 0|1}.
    let GradingSample {
        question,
        golden_answer,
        reference,
        completion,
    } = sample;
    format!(
        r#"You are grading an answer produced by a documentation question-answering assistant.

Reference documentation:
<reference>
{reference}
</reference>

Question:
<question>
{question}
</question>

Golden answer:
<golden_answer>
{golden_answer}
</golden_answer>

Candidate answer:
<completion>
{completion}
</completion>

Rules:
1) The candidate passes (score 1) only if it is consistent with the golden answer and the reference.
2) Missing a key fact from the golden answer, or contradicting it, is a fail (score 0).
3) Extra detail that is supported by the reference does not cause a fail.

Output:
Return only a JSON object of the form {{"reasoning": "<one short paragraph>", "score": 0 or 1}}.
"#
    )
}

fn is_fence_info(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// "```json{...}```": the info tag runs straight into the payload.
fn strip_inline_json_tag(s: &str) -> &str {
    match s.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") && s[4..].trim_start().starts_with(['{', '[']) => &s[4..],
        _ => s,
    }
}

/// Body of the first fenced code block in `response`, or the trimmed response when unfenced.
pub fn strip_code_fence(response: &str) -> &str {
    let t = response.trim();
    let Some(open) = t.find("```") else {
        return t;
    };
    let after = &t[open + 3..];
    let body = match after.find('\n') {
        Some(nl) if is_fence_info(after[..nl].trim()) => &after[nl + 1..],
        _ => strip_inline_json_tag(after),
    };
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Parse a grader reply into `{reasoning, score}`; the score has to be 0 or 1.
pub fn parse_grade(response: &str) -> Result<GradeResult, AppError> {
    let body = strip_code_fence(response);
    let grade: GradeResult = serde_json::from_str(body).map_err(|e| {
        AppError::new(GRADING_PARSE_FAILED, "Grader response is not a valid grade object")
            .with_details(format!("err={e}; body={}", preview(body, 200)))
    })?;
    if grade.score > 1 {
        return Err(AppError::new(GRADING_PARSE_FAILED, "Grade score must be 0 or 1")
            .with_details(format!("score={}", grade.score)));
    }
    Ok(grade)
}

/// Fraction of passing grades; 0.0 when there are none.
pub fn accuracy(grades: &[GradeResult]) -> f64 {
    if grades.is_empty() {
        return 0.0;
    }
    grades.iter().filter(|g| g.passed()).count() as f64 / grades.len() as f64
}

fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte, _)) => format!("{}...", &s[..byte]),
        None => s.to_string(),
    }
}
