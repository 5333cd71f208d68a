//! SEO prompt template.

/// Label the model must put before the SEO title.
pub const TITLE_LABEL: &str = "SEO Title:";

/// Label the model must put before the meta description.
pub const DESCRIPTION_LABEL: &str = "Meta Description:";

/// Build the generation prompt for one document.
///
/// `excerpt` should already be word-truncated by the caller.
pub fn build_seo_prompt(original_title: &str, excerpt: &str) -> String {
    format!(
        "You are an SEO assistant. Write a search-friendly title and a meta description \
for the document below.\n\
\n\
Original title: {original_title}\n\
Content excerpt: {excerpt}\n\
\n\
Respond with exactly two lines and nothing else:\n\
{TITLE_LABEL} <a concise title under 60 characters; reuse the original title verbatim if it already fits>\n\
{DESCRIPTION_LABEL} <one or two sentences under 160 characters summarizing the document>\n"
    )
}
