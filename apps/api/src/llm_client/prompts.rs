// Prompt constants for the CV text improver.

/// System prompt shared by every CV rewrite.
pub const CV_REWRITE_SYSTEM: &str = "You are an experienced CV writer for the Angolan \
    and international job market. \
    Reply with the rewritten text only, in Angolan Portuguese (pt-AO). \
    Do NOT add headings, quotes, markdown, explanations or alternatives. \
    Do NOT invent employers, dates, numbers or qualifications that are not in the original.";

/// Professional summary rewrite. Replace `{text}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = "Rewrite this professional summary for a CV. \
    Make it impactful, executive and persuasive. \
    Original text: \"{text}\"";

/// Experience description rewrite. Replace `{text}` before sending.
pub const DESCRIPTION_PROMPT_TEMPLATE: &str = "Rewrite this work experience description for a CV. \
    Use action verbs, quantify results where the original allows it, \
    and keep a professional, direct tone. \
    Original text: \"{text}\"";
