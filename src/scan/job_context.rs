use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::dom::{ElementTree, NodeId, collapse_whitespace};
use crate::scan::field_model::JobContext;

const MAX_NAME_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 5000;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static TITLE_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:job application for\s+)?(?P<role>.+?)\s+(?:at|@|-|–|\|)\s+(?P<company>[^|\-–]+?)(?:\s*[|\-–].*)?$")
        .expect("valid regex")
});

/// Best-effort job context from URL, structured data, meta tags, DOM and title.
///
/// Each attribute takes the first non-empty source in that order.
pub fn extract_job_context(tree: &dyn ElementTree) -> JobContext {
    let sources = [
        from_url(tree.url()),
        from_json_ld(tree),
        from_meta(tree),
        from_dom(tree),
        from_title(tree.title()),
    ];

    let mut ctx = JobContext::default();
    for source in sources {
        if ctx.company_name.is_empty() {
            ctx.company_name = source.company_name;
        }
        if ctx.role_title.is_empty() {
            ctx.role_title = source.role_title;
        }
        if ctx.job_description.is_empty() {
            ctx.job_description = source.job_description;
        }
    }

    JobContext {
        company_name: truncate_chars(&ctx.company_name, MAX_NAME_CHARS),
        role_title: truncate_chars(&ctx.role_title, MAX_NAME_CHARS),
        job_description: truncate_chars(&ctx.job_description, MAX_DESCRIPTION_CHARS),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    let text = collapse_whitespace(text);
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Company slug from well-known ATS hosts.
pub fn from_url(raw: &str) -> JobContext {
    let mut ctx = JobContext::default();
    let Ok(url) = Url::parse(raw) else {
        return ctx;
    };
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let first_segment = url
        .path_segments()
        .and_then(|mut s| s.next())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let slug = if host.ends_with("greenhouse.io")
        || host == "jobs.lever.co"
        || host == "jobs.ashbyhq.com"
        || host == "jobs.smartrecruiters.com"
    {
        first_segment.filter(|s| s != "embed")
    } else if host.contains(".myworkdayjobs.com") {
        host.split('.').next().map(str::to_string)
    } else {
        None
    };

    if let Some(slug) = slug {
        ctx.company_name = humanize_slug(&slug);
    }
    ctx
}

fn humanize_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `JobPosting` entries in `application/ld+json` scripts.
pub fn from_json_ld(tree: &dyn ElementTree) -> JobContext {
    let scripts = tree.elements_by_tag(&["script"]).into_iter().filter(|s| {
        tree.attr(*s, "type")
            .is_some_and(|t| t.eq_ignore_ascii_case("application/ld+json"))
    });

    for script in scripts {
        let raw = tree.collect_text(script, &[]);
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        if let Some(posting) = find_job_posting(&value) {
            return JobContext {
                company_name: organization_name(posting.get("hiringOrganization")),
                role_title: posting
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                job_description: posting
                    .get("description")
                    .and_then(Value::as_str)
                    .map(strip_html)
                    .unwrap_or_default(),
            };
        }
    }
    JobContext::default()
}

fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_job_posting),
        Value::Object(map) => {
            let is_posting = match map.get("@type") {
                Some(Value::String(t)) => t == "JobPosting",
                Some(Value::Array(types)) => types.iter().any(|t| t == "JobPosting"),
                _ => false,
            };
            if is_posting {
                Some(value)
            } else {
                map.get("@graph").and_then(find_job_posting)
            }
        }
        _ => None,
    }
}

fn organization_name(org: Option<&Value>) -> String {
    match org {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    collapse_whitespace(
        &text
            .replace("&amp;", "&")
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">"),
    )
}

pub fn from_meta(tree: &dyn ElementTree) -> JobContext {
    let meta = |key: &str| -> String {
        tree.elements_by_tag(&["meta"])
            .into_iter()
            .find(|m| tree.attr(*m, "property") == Some(key) || tree.attr(*m, "name") == Some(key))
            .and_then(|m| tree.attr(m, "content"))
            .map(collapse_whitespace)
            .unwrap_or_default()
    };

    let description = {
        let d = meta("description");
        if d.is_empty() { meta("og:description") } else { d }
    };
    JobContext {
        company_name: meta("og:site_name"),
        role_title: meta("og:title"),
        job_description: description,
    }
}

pub fn from_dom(tree: &dyn ElementTree) -> JobContext {
    let first_text = |pred: &dyn Fn(NodeId) -> bool| -> String {
        tree.descendants(tree.root())
            .into_iter()
            .filter(|n| pred(*n))
            .map(|n| tree.text_content(n))
            .find(|t| !t.is_empty())
            .unwrap_or_default()
    };
    let class_or_id = |node: NodeId, fragments: &[&str]| {
        let haystack = format!(
            "{} {}",
            tree.attr(node, "class").unwrap_or_default(),
            tree.attr(node, "id").unwrap_or_default()
        )
        .to_lowercase();
        fragments.iter().any(|f| haystack.contains(f))
    };

    JobContext {
        company_name: first_text(&|n| {
            class_or_id(n, &["company-name", "company_name", "companyname", "employer"])
        }),
        role_title: first_text(&|n| {
            tree.tag(n) == Some("h1") || class_or_id(n, &["job-title", "posting-headline", "job_title"])
        }),
        job_description: first_text(&|n| {
            class_or_id(
                n,
                &["job-description", "job_description", "jobdescription", "posting-description"],
            )
        }),
    }
}

/// "Role at Company", "Role - Company", "Role | Company".
pub fn from_title(title: &str) -> JobContext {
    let title = collapse_whitespace(title);
    let Some(caps) = TITLE_SPLIT.captures(&title) else {
        return JobContext::default();
    };
    JobContext {
        company_name: caps
            .name("company")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        role_title: caps
            .name("role")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        job_description: String::new(),
    }
}
