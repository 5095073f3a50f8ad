use form_autofill::scan::extract_job_context;
use form_autofill::scan::job_context::{from_title, from_url};
use serde_json::json;

mod common;
use common::page;

// ============================================================================
// URL
// ============================================================================

#[test]
fn company_from_known_ats_hosts() {
    assert_eq!(from_url("https://boards.greenhouse.io/acme-corp/jobs/4021").company_name, "Acme Corp");
    assert_eq!(from_url("https://jobs.lever.co/stripe/5c1e-apply").company_name, "Stripe");
    assert_eq!(
        from_url("https://nvidia.wd5.myworkdayjobs.com/en-US/NVIDIAExternal/job/123").company_name,
        "Nvidia"
    );
    assert_eq!(from_url("https://jobs.ashbyhq.com/linear_app/9f2").company_name, "Linear App");
}

#[test]
fn unknown_hosts_and_embeds_give_nothing() {
    assert!(from_url("https://example.com/careers/apply").is_empty());
    assert!(from_url("https://boards.greenhouse.io/embed/job_app?for=acme").is_empty());
    assert!(from_url("not a url").is_empty());
}

// ============================================================================
// Title
// ============================================================================

#[test]
fn title_patterns_split_role_and_company() {
    let ctx = from_title("Senior Backend Engineer at Acme Corp");
    assert_eq!(ctx.role_title, "Senior Backend Engineer");
    assert_eq!(ctx.company_name, "Acme Corp");

    let ctx = from_title("Job Application for Data Analyst at Globex");
    assert_eq!(ctx.role_title, "Data Analyst");
    assert_eq!(ctx.company_name, "Globex");

    let ctx = from_title("Product Designer | Initech");
    assert_eq!(ctx.role_title, "Product Designer");
    assert_eq!(ctx.company_name, "Initech");
}

#[test]
fn plain_title_is_not_split() {
    assert!(from_title("Careers").is_empty());
}

// ============================================================================
// Page sources and precedence
// ============================================================================

#[test]
fn json_ld_job_posting_is_read() {
    let posting = json!({
        "@context": "https://schema.org",
        "@graph": [{
            "@type": "JobPosting",
            "title": "Platform Engineer",
            "hiringOrganization": { "@type": "Organization", "name": "Umbrella" },
            "description": "<p>Build &amp; ship <b>reliable</b> systems.</p>"
        }]
    });
    let d = page(
        "https://example.com/jobs/1",
        "Apply",
        json!([
            { "tag": "script", "attrs": { "type": "application/ld+json" }, "text": posting.to_string() }
        ]),
    );
    let ctx = extract_job_context(&d);
    assert_eq!(ctx.company_name, "Umbrella");
    assert_eq!(ctx.role_title, "Platform Engineer");
    assert_eq!(ctx.job_description, "Build & ship reliable systems.");
}

#[test]
fn meta_and_dom_fill_gaps() {
    let d = page(
        "https://example.com/jobs/2",
        "Apply",
        json!([
            { "tag": "meta", "attrs": { "name": "description", "content": "Join our payments team." } },
            { "tag": "h1", "text": "Staff Engineer" },
            { "tag": "div", "attrs": { "class": "company-name" }, "text": "Initech" }
        ]),
    );
    let ctx = extract_job_context(&d);
    assert_eq!(ctx.role_title, "Staff Engineer");
    assert_eq!(ctx.company_name, "Initech");
    assert_eq!(ctx.job_description, "Join our payments team.");
}

#[test]
fn url_outranks_title() {
    let d = page(
        "https://boards.greenhouse.io/acme/jobs/7",
        "Site Reliability Engineer at Someone Else",
        json!([{ "tag": "p", "text": "Apply below" }]),
    );
    let ctx = extract_job_context(&d);
    assert_eq!(ctx.company_name, "Acme");
    assert_eq!(ctx.role_title, "Site Reliability Engineer");
}

#[test]
fn long_values_are_capped() {
    let description = "word ".repeat(2000);
    let company = "x".repeat(300);
    let d = page(
        "https://example.com/jobs/3",
        "Apply",
        json!([
            { "tag": "meta", "attrs": { "property": "og:site_name", "content": company } },
            { "tag": "meta", "attrs": { "name": "description", "content": description } }
        ]),
    );
    let ctx = extract_job_context(&d);
    assert_eq!(ctx.company_name.chars().count(), 200);
    assert_eq!(ctx.job_description.chars().count(), 5000);
}

#[test]
fn empty_page_gives_empty_context() {
    let d = page("about:blank", "", json!([{ "tag": "div" }]));
    assert!(extract_job_context(&d).is_empty());
}
