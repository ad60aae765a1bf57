// Prompt constants for the fit analysis call.

/// Fixes persona, output language and tone.
pub const ANALYSIS_SYSTEM: &str = "You are an experienced career coach and technical recruiter. \
    You assess how well a candidate's CV matches a specific job posting. \
    Always answer in English. \
    Be honest, concrete and encouraging: name weaknesses plainly, \
    but frame every gap together with a way to address it.";

/// Requested answer length, communicated to the model only.
pub const MAX_ANSWER_CHARS: usize = 1500;

/// Analysis prompt template. Replace `{job_text}`, `{cv_text}` and
/// `{max_answer_chars}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Compare the following job posting with the candidate's CV.

JOB POSTING:
"""
{job_text}
"""

CANDIDATE CV:
"""
{cv_text}
"""

Answer with exactly these five sections:
1. Overall fit: an estimated match percentage (0-100%) with a one-sentence justification.
2. Matched requirements: the job requirements the CV clearly covers.
3. Gaps: requirements that are missing or only weakly supported by the CV.
4. CV improvements: concrete edits to the CV (rewordings, additions, reordering) that would strengthen this application.
5. Keywords: terms from the posting that should appear in the CV but do not.

Keep the whole answer under {max_answer_chars} characters. Use short bullet points, no introduction and no closing remarks."#;
