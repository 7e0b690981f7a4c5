// All LLM prompt constants for the Outreach module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Job extraction prompt template.
/// Replace: {page_data}, {json_only_instruction}
pub const EXTRACT_JOBS_PROMPT_TEMPLATE: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}
### INSTRUCTION:
The scraped text is from the career's page of a website.
Your job is to extract the job postings and return them in JSON format containing the following keys: `role`, `experience`, `skills` and `description`.
Do not include any other keys.
{json_only_instruction}
### VALID JSON (NO PREAMBLE):
"#;

/// Cold email prompt template.
/// Replace: {job_description}, {link_list}, {sender_name}, {sender_title},
///          {company_name}, {company_pitch}, {no_preamble_instruction}
pub const WRITE_EMAIL_PROMPT_TEMPLATE: &str = r#"### JOB DESCRIPTION:
{job_description}

### INSTRUCTION:
You are {sender_name}, a {sender_title} at {company_name}. {company_pitch}
Your job is to write a cold email to the client regarding the job mentioned above describing the capability of {company_name} in fulfilling their needs.
Also add the most relevant ones from the following links to showcase {company_name}'s portfolio: {link_list}
Remember you are {sender_name}, {sender_title} at {company_name}.
{no_preamble_instruction} Do not add any commentary after the email.
### EMAIL (NO PREAMBLE):
"#;

/// Default company pitch used when none is configured.
pub const DEFAULT_COMPANY_PITCH: &str = "XYZ is an AI & Software Consulting company dedicated to facilitating \
    the seamless integration of business processes through automated tools. \
    Over our experience, we have empowered numerous enterprises with tailored solutions, fostering scalability, \
    process optimization, cost reduction, and heightened overall efficiency.";
