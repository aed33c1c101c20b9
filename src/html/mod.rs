//! # HTML Exporter
//!
//! Serializes a snapshot and a template into one standalone HTML document:
//! an embedded `<style>` block, no scripts, no external stylesheets or
//! images. The page follows the preview's rules (section order, header
//! arrangement, heading decoration) and carries print rules that express the
//! same pagination intent declaratively, leaving the actual breaking to the
//! browser's print engine.
//!
//! The output is a pure function of its inputs. It contains no timestamp.

use std::fmt::Write;

use crate::model::{displayable, ResumeData};
use crate::template::{HeaderStyle, SectionStyle, Template};
use crate::style::SizeToken;

/// Escape text for element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `{Name}_Portfolio.html`, with the name sanitized (`Portfolio` when blank).
pub fn portfolio_file_name(data: &ResumeData) -> String {
    format!(
        "{}_Portfolio.html",
        crate::export::sanitize_file_stem(&data.full_name, "Portfolio")
    )
}

/// Render the standalone portfolio page.
pub fn portfolio_html(data: &ResumeData, template: &Template) -> String {
    let mut out = String::new();
    let title = format!(
        "{} - {}",
        data.name().unwrap_or("Portfolio"),
        template.name
    );

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_html(&title));
    out.push_str("<style>\n");
    out.push_str(&stylesheet(template));
    out.push_str("</style>\n</head>\n<body>\n<div class=\"container\">\n");

    header(&mut out, data, template.header_style);

    if let Some(about) = data.about() {
        open_section(&mut out, "About Me", false);
        let _ = writeln!(out, "<p class=\"item-description\">{}</p>", escape_html(about));
        out.push_str("</section>\n");
    }

    if data.has_skills() {
        open_section(&mut out, "Skills", false);
        out.push_str("<div class=\"skills\">");
        for skill in data.visible_skills() {
            let _ = write!(out, "<span class=\"skill\">{}</span>", escape_html(skill));
        }
        out.push_str("</div>\n</section>\n");
    }

    if data.has_experience() {
        open_section(&mut out, "Experience", true);
        for exp in data.visible_experience() {
            out.push_str("<div class=\"item\">\n");
            item_header(&mut out, &exp.role, &exp.duration);
            subtitle(&mut out, &exp.company);
            out.push_str("</div>\n");
        }
        out.push_str("</section>\n");
    }

    if data.has_education() {
        open_section(&mut out, "Education", true);
        for edu in data.visible_education() {
            out.push_str("<div class=\"item\">\n");
            item_header(&mut out, &edu.degree, &edu.year);
            subtitle(&mut out, &edu.institution);
            out.push_str("</div>\n");
        }
        out.push_str("</section>\n");
    }

    if data.has_projects() {
        open_section(&mut out, "Projects", true);
        for project in data.visible_projects() {
            out.push_str("<div class=\"item\">\n");
            if let Some(title) = displayable(&project.title) {
                let _ = writeln!(out, "<div class=\"item-title\">{}</div>", escape_html(title));
            }
            if let Some(description) = displayable(&project.description) {
                let _ = writeln!(
                    out,
                    "<p class=\"item-description\">{}</p>",
                    escape_html(description)
                );
            }
            if let Some(tech) = displayable(&project.tech_used) {
                let _ = writeln!(
                    out,
                    "<p class=\"item-subtitle\">Technologies: {}</p>",
                    escape_html(tech)
                );
            }
            if let Some(link) = displayable(&project.github_link) {
                match safe_href(link) {
                    Some(href) => {
                        let _ = writeln!(
                            out,
                            "<a class=\"item-link\" href=\"{}\">GitHub Repository</a>",
                            escape_html(&href)
                        );
                    }
                    None => {
                        let _ = writeln!(out, "<span class=\"item-link\">{}</span>", escape_html(link));
                    }
                }
            }
            out.push_str("</div>\n");
        }
        out.push_str("</section>\n");
    }

    out.push_str("<footer class=\"footer\">Made with BuildFolio</footer>\n");
    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn open_section(out: &mut String, title: &str, list: bool) {
    let class = if list { "section section-list" } else { "section" };
    let _ = writeln!(out, "<section class=\"{}\">", class);
    let _ = writeln!(out, "<h2 class=\"section-title\">{}</h2>", escape_html(title));
}

fn item_header(out: &mut String, title: &str, date: &str) {
    let title = displayable(title);
    let date = displayable(date);
    if title.is_none() && date.is_none() {
        return;
    }
    out.push_str("<div class=\"item-header\">");
    let _ = write!(
        out,
        "<div class=\"item-title\">{}</div>",
        escape_html(title.unwrap_or(""))
    );
    if let Some(date) = date {
        let _ = write!(out, "<div class=\"item-date\">{}</div>", escape_html(date));
    }
    out.push_str("</div>\n");
}

fn subtitle(out: &mut String, text: &str) {
    if let Some(text) = displayable(text) {
        let _ = writeln!(out, "<div class=\"item-subtitle\">{}</div>", escape_html(text));
    }
}

fn contact_span(out: &mut String, icon: &str, text: &str) {
    let _ = write!(out, "<span>{} {}</span>", icon, escape_html(text));
}

fn contact_link(out: &mut String, icon: &str, label: &str, link: &str) {
    match safe_href(link) {
        Some(href) => {
            let _ = write!(
                out,
                "<span>{} <a href=\"{}\">{}</a></span>",
                icon,
                escape_html(&href),
                label
            );
        }
        None => contact_span(out, icon, link),
    }
}

/// Link target for a user-entered URL.
///
/// `http`, `https` and `mailto` pass through. A bare host such as
/// `github.com/ada` gets `https://`. Any other scheme yields `None` and the
/// caller prints the text instead of an anchor.
fn safe_href(link: &str) -> Option<String> {
    let link = link.trim();
    let scheme = link.split_once(':').map(|(scheme, _)| scheme).filter(|scheme| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    });
    match scheme {
        None => Some(format!("https://{}", link.trim_start_matches('/'))),
        Some(scheme) if ["http", "https", "mailto"].iter().any(|s| scheme.eq_ignore_ascii_case(s)) => {
            Some(link.to_string())
        }
        Some(_) => None,
    }
}

fn header(out: &mut String, data: &ResumeData, style: HeaderStyle) {
    let contact = &data.contact;
    let name = escape_html(data.name().unwrap_or("Your Name"));

    out.push_str("<header class=\"header\">\n");
    match style {
        HeaderStyle::Center | HeaderStyle::Left => {
            let _ = writeln!(out, "<h1 class=\"name\">{}</h1>", name);
            if !contact.is_empty() {
                out.push_str("<div class=\"contact\">");
                direct_contacts(out, data);
                link_contacts(out, data);
                out.push_str("</div>\n");
            }
        }
        HeaderStyle::Split => {
            out.push_str("<div>\n");
            let _ = writeln!(out, "<h1 class=\"name\">{}</h1>", name);
            out.push_str("<div class=\"contact-split\">");
            direct_contacts(out, data);
            out.push_str("</div>\n</div>\n");
            if contact.linkedin().is_some() || contact.github().is_some() {
                out.push_str("<div class=\"contact-split contact-links\">");
                link_contacts(out, data);
                out.push_str("</div>\n");
            }
        }
    }
    out.push_str("</header>\n");
}

fn direct_contacts(out: &mut String, data: &ResumeData) {
    if let Some(email) = data.contact.email() {
        contact_span(out, "\u{1F4E7}", email);
    }
    if let Some(phone) = data.contact.phone() {
        contact_span(out, "\u{1F4DE}", phone);
    }
}

fn link_contacts(out: &mut String, data: &ResumeData) {
    if let Some(linkedin) = data.contact.linkedin() {
        contact_link(out, "\u{1F4BC}", "LinkedIn", linkedin);
    }
    if let Some(github) = data.contact.github() {
        contact_link(out, "\u{1F517}", "GitHub", github);
    }
}

/// The embedded style sheet for a template.
fn stylesheet(template: &Template) -> String {
    let scheme = &template.color_scheme;
    let t = &template.typography;
    let mut css = String::new();

    css.push_str("* { margin: 0; padding: 0; box-sizing: border-box; }\n");
    let _ = writeln!(
        css,
        "body {{ font-family: system-ui, -apple-system, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; \
         font-size: {}rem; font-weight: {}; line-height: 1.6; padding: 20px; background: #f8fafc; color: {}; }}",
        t.body_size.rem(),
        t.body_font.value(),
        scheme.text
    );
    let _ = writeln!(
        css,
        ".container {{ max-width: 800px; margin: 0 auto; background: {}; padding: 40px; \
         border-radius: 12px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }}",
        scheme.background
    );

    let header_layout = match template.header_style {
        HeaderStyle::Center => "text-align: center;",
        HeaderStyle::Left => "text-align: left;",
        HeaderStyle::Split => "display: flex; justify-content: space-between; align-items: flex-start; gap: 16px;",
    };
    let _ = writeln!(css, ".header {{ {} margin-bottom: 32px; }}", header_layout);
    let _ = writeln!(
        css,
        ".name {{ font-size: {}rem; font-weight: 700; color: {}; margin-bottom: 8px; overflow-wrap: anywhere; }}",
        SizeToken::Xxxl.rem(),
        scheme.primary
    );
    let justify = if template.header_style == HeaderStyle::Center {
        "center"
    } else {
        "flex-start"
    };
    let _ = writeln!(
        css,
        ".contact {{ display: flex; flex-wrap: wrap; justify-content: {}; gap: 16px; \
         font-size: {}rem; color: {}; }}",
        justify,
        SizeToken::Sm.rem(),
        scheme.secondary
    );
    let _ = writeln!(
        css,
        ".contact-split {{ display: flex; flex-direction: column; gap: 4px; font-size: {}rem; color: {}; }}",
        SizeToken::Sm.rem(),
        scheme.secondary
    );
    css.push_str(".contact-links { text-align: right; }\n");
    let _ = writeln!(css, ".header a {{ color: inherit; }}");

    css.push_str(".section { margin-bottom: 24px; }\n");
    let decoration = match template.section_style {
        SectionStyle::Bordered => format!("border-bottom: 2px solid {}; padding-bottom: 4px;", scheme.accent),
        SectionStyle::Cards => format!("background: {}; padding: 12px; border-radius: 8px;", scheme.accent),
        SectionStyle::Minimal => "padding-bottom: 4px;".to_string(),
    };
    let _ = writeln!(
        css,
        ".section-title {{ font-size: {}rem; font-weight: {}; color: {}; margin-bottom: 12px; {} }}",
        t.heading_size.rem(),
        t.heading_font.value(),
        scheme.primary,
        decoration
    );

    css.push_str(".skills { display: flex; flex-wrap: wrap; gap: 8px; }\n");
    let _ = writeln!(
        css,
        ".skill {{ background: {}; color: {}; border: 1px solid {}; padding: 2px 10px; \
         border-radius: 9999px; font-size: {}rem; font-weight: 600; }}",
        scheme.accent,
        scheme.primary,
        scheme.secondary,
        SizeToken::Xs.rem()
    );

    let card = if template.section_style == SectionStyle::Cards {
        format!(" background: {}; padding: 16px; border-radius: 8px;", scheme.accent)
    } else {
        String::new()
    };
    let _ = writeln!(css, ".item {{ margin-bottom: 16px;{} }}", card);
    css.push_str(
        ".item-header { display: flex; justify-content: space-between; align-items: flex-start; \
         gap: 8px; margin-bottom: 4px; }\n",
    );
    let _ = writeln!(
        css,
        ".item-title {{ font-size: {}rem; font-weight: {}; color: {}; flex: 1; min-width: 0; }}",
        SizeToken::Base.rem(),
        t.heading_font.value(),
        scheme.text
    );
    let _ = writeln!(
        css,
        ".item-date {{ color: {}; flex-shrink: 0; }}",
        scheme.secondary
    );
    let _ = writeln!(
        css,
        ".item-subtitle {{ color: {}; margin-bottom: 4px; }}",
        scheme.secondary
    );
    let _ = writeln!(
        css,
        ".item-description {{ color: {}; text-align: justify; margin-bottom: 8px; }}",
        scheme.text
    );
    let _ = writeln!(css, ".item-link {{ color: {}; }}", scheme.primary);
    let _ = writeln!(
        css,
        ".footer {{ text-align: center; margin-top: 40px; padding-top: 20px; \
         border-top: 1px solid {}; color: {}; font-size: {}rem; }}",
        scheme.accent,
        scheme.secondary,
        SizeToken::Sm.rem()
    );

    css.push_str(
        "@media (max-width: 768px) {\n\
         .container { padding: 20px; }\n\
         .name { font-size: 2rem; }\n\
         .contact { justify-content: center; }\n\
         .header { text-align: center !important; display: block !important; }\n\
         .contact-links { text-align: center; }\n\
         .item-header { flex-direction: column; align-items: start; }\n\
         }\n",
    );
    css.push_str(
        "@media print {\n\
         body { background: white; padding: 0; line-height: 1.3; \
         -webkit-print-color-adjust: exact; print-color-adjust: exact; }\n\
         .container { box-shadow: none; margin: 0; max-width: none; padding: 0; border-radius: 0; }\n\
         .header { page-break-inside: avoid; break-inside: avoid; margin-bottom: 15pt; }\n\
         .section { page-break-inside: avoid; break-inside: avoid; margin-bottom: 10pt; }\n\
         .section-list { page-break-inside: auto; break-inside: auto; }\n\
         .section-title { page-break-after: avoid; break-after: avoid; }\n\
         .item { page-break-inside: avoid; break-inside: avoid; }\n\
         .footer { page-break-inside: avoid; break-inside: avoid; }\n\
         p { orphans: 3; widows: 3; }\n\
         }\n",
    );
    css
}
