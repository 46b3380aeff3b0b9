//! Layout engine — one algorithm for every template, driven by `TemplateStyle`.
//!
//! Sections backed by empty data are left out entirely, heading included.

use crate::models::cv::{CvData, CvEducation, CvExperience};
use crate::render::document::{
    Contact, ContactKind, Document, Entry, Header, Section, SectionBody, Watermark,
};
use crate::render::template::{SectionKind, TemplateKind, TemplateStyle};

const PRESENT_LABEL: &str = "Presente";

/// Renders `cv` with the given template. `watermarked` should be true whenever
/// the viewer is not premium-valid.
pub fn render(
    template: TemplateKind,
    cv: &CvData,
    education_first: bool,
    watermarked: bool,
) -> Document {
    let style = template.style();

    let contacts = collect_contacts(cv);
    let header = Header {
        name: non_blank(&cv.full_name)
            .unwrap_or(style.name_placeholder)
            .to_string(),
        role: cv
            .title
            .as_deref()
            .and_then(non_blank)
            .or(style.role_placeholder)
            .map(str::to_string),
        photo_uri: cv.photo_uri.as_deref().and_then(non_blank).map(str::to_string),
        contacts: if style.contacts_in_header {
            contacts.clone()
        } else {
            Vec::new()
        },
    };

    let sidebar = style
        .sidebar
        .iter()
        .filter_map(|kind| build_section(*kind, style, cv, &contacts))
        .collect();

    let ordered: [SectionKind; 2] = if education_first {
        [SectionKind::Education, SectionKind::Experience]
    } else {
        [SectionKind::Experience, SectionKind::Education]
    };
    let main = style
        .main_lead
        .iter()
        .chain(ordered.iter())
        .filter_map(|kind| build_section(*kind, style, cv, &contacts))
        .collect();

    Document {
        template,
        class_prefix: style.class_prefix,
        header,
        sidebar,
        main,
        watermark: watermarked.then(Watermark::default),
    }
}

fn build_section(
    kind: SectionKind,
    style: &TemplateStyle,
    cv: &CvData,
    contacts: &[Contact],
) -> Option<Section> {
    let headings = &style.headings;
    let (heading, body) = match kind {
        SectionKind::Summary => {
            let summary = non_blank(&cv.summary)?;
            (headings.summary, SectionBody::Text(summary.to_string()))
        }
        SectionKind::Contacts => {
            if contacts.is_empty() {
                return None;
            }
            (Some(headings.contacts), SectionBody::Contacts(contacts.to_vec()))
        }
        SectionKind::Skills => {
            if cv.skills.is_empty() {
                return None;
            }
            (Some(headings.skills), SectionBody::Tags(cv.skills.clone()))
        }
        SectionKind::Experience => {
            if cv.experiences.is_empty() {
                return None;
            }
            let entries = cv
                .experiences
                .iter()
                .map(|e| experience_entry(e, style.date_separator))
                .collect();
            (Some(headings.experience), SectionBody::Entries(entries))
        }
        SectionKind::Education => {
            if cv.education.is_empty() {
                return None;
            }
            let entries = cv.education.iter().map(education_entry).collect();
            (Some(headings.education), SectionBody::Entries(entries))
        }
    };

    Some(Section {
        kind,
        heading,
        body,
    })
}

fn experience_entry(exp: &CvExperience, separator: &str) -> Entry {
    let end = if exp.is_current {
        PRESENT_LABEL
    } else {
        exp.end_date.as_str()
    };
    Entry {
        title: exp.role.clone(),
        subtitle: exp.company.clone(),
        dates: format!("{} {separator} {}", exp.start_date, end),
        description: non_blank(&exp.description).map(str::to_string),
    }
}

fn education_entry(edu: &CvEducation) -> Entry {
    Entry {
        title: edu.degree.clone(),
        subtitle: edu.school.clone(),
        dates: edu.year.clone(),
        description: None,
    }
}

fn collect_contacts(cv: &CvData) -> Vec<Contact> {
    [
        (ContactKind::Phone, &cv.phone),
        (ContactKind::Email, &cv.email),
        (ContactKind::Location, &cv.location),
    ]
    .into_iter()
    .filter_map(|(kind, value)| {
        non_blank(value).map(|v| Contact {
            kind,
            value: v.to_string(),
        })
    })
    .collect()
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
