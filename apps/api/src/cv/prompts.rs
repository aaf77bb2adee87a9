/// Skill profile extraction. Replace: {cv_text}
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Analyze this CV and extract the main technical skills.

Return a JSON object with exactly this structure:
{
  "skills": ["skill1", "skill2"],
  "experience_years": <number or null>,
  "education_level": "<level or null>",
  "programming_languages": ["language1"],
  "frameworks": ["framework1"],
  "tools": ["tool1"]
}

CV to analyze:
{cv_text}"#;
