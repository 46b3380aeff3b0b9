//! Rendered CV document and its print-ready HTML form.
//!
//! The HTML contains the CV and nothing else (no app chrome), so whatever the
//! client prints or saves is exactly the document.

use serde::Serialize;

use crate::render::template::{SectionKind, TemplateKind};

pub const WATERMARK_TEXT: &str = "ANGOLIFE";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Document {
    pub template: TemplateKind,
    pub class_prefix: &'static str,
    pub header: Header,
    pub sidebar: Vec<Section>,
    pub main: Vec<Section>,
    /// Overlay only; never shifts the content beneath it.
    pub watermark: Option<Watermark>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Header {
    pub name: String,
    pub role: Option<String>,
    pub photo_uri: Option<String>,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Phone,
    Email,
    Location,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Contact {
    pub kind: ContactKind,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: Option<&'static str>,
    pub body: SectionBody,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum SectionBody {
    Text(String),
    Tags(Vec<String>),
    Contacts(Vec<Contact>),
    Entries(Vec<Entry>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Entry {
    pub title: String,
    pub subtitle: String,
    pub dates: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Watermark {
    pub text: &'static str,
    pub angle_deg: i16,
    pub opacity: f32,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            text: WATERMARK_TEXT,
            angle_deg: 45,
            opacity: 0.03,
        }
    }
}

impl Document {
    /// Section kinds in document order: sidebar first, then main column.
    pub fn section_order(&self) -> Vec<SectionKind> {
        self.sidebar
            .iter()
            .chain(self.main.iter())
            .map(|s| s.kind)
            .collect()
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.sidebar.iter().chain(self.main.iter()).any(|s| s.kind == kind)
    }

    pub fn to_html(&self) -> String {
        let p = self.class_prefix;
        let mut html = String::with_capacity(4096);

        html.push_str("<!DOCTYPE html>\n<html lang=\"pt-AO\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", escape(&self.header.name)));
        html.push_str("<style>@page { margin: 0; size: auto; } body { margin: 0; } #cv-preview { position: relative; padding: 40px; }</style>\n");
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!(
            "<div id=\"cv-preview\" class=\"cv-template-container {p}-wrapper\">\n"
        ));

        self.push_header(&mut html);

        html.push_str(&format!("<div class=\"{p}-body-row\">\n"));
        html.push_str(&format!("<aside class=\"{p}-sidebar\">\n"));
        for section in &self.sidebar {
            push_section(&mut html, p, section);
        }
        html.push_str("</aside>\n");
        html.push_str(&format!("<main class=\"{p}-main\">\n"));
        for section in &self.main {
            push_section(&mut html, p, section);
        }
        html.push_str("</main>\n</div>\n");

        // Absolutely positioned after the body so it cannot move any content.
        if let Some(mark) = &self.watermark {
            html.push_str(&format!(
                "<div class=\"cv-watermark\" aria-hidden=\"true\" style=\"position: absolute; inset: 0; pointer-events: none; user-select: none; overflow: hidden; display: flex; align-items: center; justify-content: center; opacity: {}; transform: rotate({}deg);\"><span>{}</span></div>\n",
                mark.opacity, mark.angle_deg, escape(mark.text)
            ));
        }

        html.push_str("</div>\n</body>\n</html>\n");
        html
    }

    fn push_header(&self, html: &mut String) {
        let p = self.class_prefix;
        html.push_str(&format!("<header class=\"{p}-header\">\n"));
        html.push_str(&format!(
            "<h1 class=\"{p}-name\">{}</h1>\n",
            escape(&self.header.name)
        ));
        if let Some(role) = &self.header.role {
            html.push_str(&format!("<div class=\"{p}-role\">{}</div>\n", escape(role)));
        }
        if !self.header.contacts.is_empty() {
            html.push_str(&format!("<div class=\"{p}-contacts\">\n"));
            push_contacts(html, p, &self.header.contacts);
            html.push_str("</div>\n");
        }
        match &self.header.photo_uri {
            Some(uri) => html.push_str(&format!(
                "<img class=\"{p}-photo\" src=\"{}\" alt=\"Foto\">\n",
                escape(uri)
            )),
            None => html.push_str(&format!(
                "<div class=\"{p}-photo {p}-photo-fallback\"></div>\n"
            )),
        }
        html.push_str("</header>\n");
    }
}

fn push_section(html: &mut String, p: &str, section: &Section) {
    html.push_str(&format!(
        "<section class=\"{p}-section\" data-section=\"{}\">\n",
        section_id(section.kind)
    ));
    if let Some(heading) = section.heading {
        html.push_str(&format!(
            "<h2 class=\"{p}-section-title\">{}</h2>\n",
            escape(heading)
        ));
    }
    match &section.body {
        SectionBody::Text(text) => {
            html.push_str(&format!("<p class=\"{p}-summary\">{}</p>\n", escape(text)));
        }
        SectionBody::Tags(tags) => {
            html.push_str(&format!("<ul class=\"{p}-skill-list\">\n"));
            for tag in tags {
                html.push_str(&format!("<li>{}</li>\n", escape(tag)));
            }
            html.push_str("</ul>\n");
        }
        SectionBody::Contacts(contacts) => push_contacts(html, p, contacts),
        SectionBody::Entries(entries) => {
            for entry in entries {
                html.push_str(&format!("<div class=\"{p}-item\">\n"));
                html.push_str(&format!(
                    "<h3 class=\"{p}-item-role\">{}</h3>\n",
                    escape(&entry.title)
                ));
                html.push_str(&format!(
                    "<div class=\"{p}-item-company\">{}</div>\n",
                    escape(&entry.subtitle)
                ));
                html.push_str(&format!(
                    "<div class=\"{p}-item-date\">{}</div>\n",
                    escape(&entry.dates)
                ));
                if let Some(description) = &entry.description {
                    html.push_str(&format!(
                        "<div class=\"{p}-item-desc\">{}</div>\n",
                        escape(description)
                    ));
                }
                html.push_str("</div>\n");
            }
        }
    }
    html.push_str("</section>\n");
}

fn push_contacts(html: &mut String, p: &str, contacts: &[Contact]) {
    for contact in contacts {
        let kind = match contact.kind {
            ContactKind::Phone => "phone",
            ContactKind::Email => "email",
            ContactKind::Location => "location",
        };
        html.push_str(&format!(
            "<div class=\"{p}-contact-item\" data-contact=\"{kind}\">{}</div>\n",
            escape(&contact.value)
        ));
    }
}

fn section_id(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Summary => "summary",
        SectionKind::Contacts => "contacts",
        SectionKind::Skills => "skills",
        SectionKind::Experience => "experience",
        SectionKind::Education => "education",
    }
}

/// Minimal HTML escaping for user-supplied text and attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
