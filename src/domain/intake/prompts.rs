//! Instructions sent to the oracle at each protocol step.

use super::frame::{Frame, FrameId, FRAME_CHECKLIST};

/// Marker the oracle emits when it judges every frame covered.
pub const COMPLETION_SENTINEL: &str = "ASSESSMENT_COMPLETE";

/// Value recorded for information the patient could not or would not give.
pub const UNKNOWN_MARKER: &str = "unknown";

const REPLY_CONTRACT: &str = r#"REPLY FORMAT:
Reply with one JSON object and nothing else.
- While frames remain: {"status": "continue", "question": "<the single next question>", "covered_frames": ["<frame id>", ...]}
- Once every frame is covered: {"status": "complete", "covered_frames": ["<frame id>", ...]}
"covered_frames" lists every frame id addressed anywhere in the conversation so far."#;

/// System framing for the whole interview: persona, checklist and rules.
pub fn framing_instruction() -> String {
    let checklist = FRAME_CHECKLIST
        .iter()
        .enumerate()
        .map(|(i, frame)| format!("{}. {}", i + 1, frame.prompt_line()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a professional, empathetic medical pre-screening assistant conducting the \
subjective part of a patient intake (History of Present Illness, SOAP \"S\" section).\n\
\n\
REQUIRED FRAMES (frame id in parentheses):\n\
{checklist}\n\
\n\
RULES:\n\
1. Ask ONE question at a time. Do not overwhelm the patient.\n\
2. Be adaptive: follow up on what the patient just said (for example, a mentioned fever \
calls for temperature and duration next).\n\
3. If an answer already covers a later frame, never ask about that frame again.\n\
4. If the patient cannot or will not answer, record the frame as \"{unknown}\" and move on.\n\
5. If the patient describes a possible emergency (for example crushing chest pain or \
difficulty breathing), tell them to seek emergency care immediately and end the interview.\n\
6. Do not diagnose or prescribe. Use plain language, no jargon.\n\
7. Never write {sentinel} inside a question.\n\
\n\
{contract}",
        checklist = checklist,
        unknown = UNKNOWN_MARKER,
        sentinel = COMPLETION_SENTINEL,
        contract = REPLY_CONTRACT,
    )
}

/// One-off request for the first question.
pub fn opening_instruction() -> String {
    format!(
        "Begin the assessment. Greet the patient briefly and ask the first question, \
about the {}.\n\n{}",
        Frame::get(FrameId::ChiefComplaint).title,
        REPLY_CONTRACT
    )
}

/// One-off steering request sent after each patient answer.
pub fn steering_instruction() -> String {
    format!(
        "The patient has just answered. Using the entire conversation, decide which frames \
are now covered. If ALL frames are covered, reply with status \"complete\" (or the bare \
token {sentinel} if you cannot produce JSON). Otherwise ask the single next most relevant \
question from the checklist, adapting to previous answers and never repeating a covered \
frame.\n\n{contract}",
        sentinel = COMPLETION_SENTINEL,
        contract = REPLY_CONTRACT
    )
}

/// Follow-up sent when completion was claimed while frames are still missing.
pub fn reprobe_instruction(missing: &[FrameId]) -> String {
    let names = missing
        .iter()
        .map(|id| Frame::get(*id).prompt_line())
        .collect::<Vec<_>>()
        .join("\n- ");

    format!(
        "The interview is not complete yet. These frames have not been addressed:\n- {names}\n\
Ask the single next question for the first of them, unless an earlier answer already \
covers it.\n\n{REPLY_CONTRACT}"
    )
}

/// Final request turning the conversation into the structured report.
pub fn report_instruction() -> String {
    format!(
        r#"The interview is complete. Act as a report-building function.
Review the entire conversation and output one valid JSON object, and nothing else, with exactly this shape:
{{
  "summary_of_complaints": "string",
  "symptom_timeline": "string",
  "key_risk_factors": ["string", ...],
  "clinical_patterns": "string (e.g. 'Viral respiratory pattern')",
  "red_flags": ["string", ...],
  "narrative_section": "one cohesive paragraph suitable for a clinical record"
}}
Use "{UNKNOWN_MARKER}" for anything the patient did not provide. Use empty lists when there are no risk factors or red flags."#
    )
}
