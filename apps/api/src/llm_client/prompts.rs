// Cross-cutting prompt fragments. Feature prompts live next to the code that sends them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every rewrite prompt.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the original resume. \
    Do NOT invent employers, titles, dates, degrees, metrics or technologies. \
    If a job keyword is not supported by the resume, leave it out.";
