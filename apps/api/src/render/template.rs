//! Template descriptors — the per-template knobs consumed by the layout engine.
//!
//! All four templates share one layout algorithm; they differ only in the
//! data below (CSS class prefix, headings, placeholders, sidebar composition).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    #[default]
    Classic,
    Modern,
    Minimalist,
    Technical,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Classic,
        TemplateKind::Modern,
        TemplateKind::Minimalist,
        TemplateKind::Technical,
    ];

    /// Unknown or empty ids fall back to `Classic`.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "modern" => TemplateKind::Modern,
            "minimalist" => TemplateKind::Minimalist,
            "technical" => TemplateKind::Technical,
            _ => TemplateKind::Classic,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            TemplateKind::Classic => "classic",
            TemplateKind::Modern => "modern",
            TemplateKind::Minimalist => "minimalist",
            TemplateKind::Technical => "technical",
        }
    }

    pub fn style(&self) -> &'static TemplateStyle {
        match self {
            TemplateKind::Classic => &CLASSIC,
            TemplateKind::Modern => &MODERN,
            TemplateKind::Minimalist => &MINIMALIST,
            TemplateKind::Technical => &TECHNICAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Summary,
    Contacts,
    Skills,
    Experience,
    Education,
}

#[derive(Debug)]
pub struct Headings {
    /// `None` renders the summary as a bare paragraph.
    pub summary: Option<&'static str>,
    pub contacts: &'static str,
    pub skills: &'static str,
    pub experience: &'static str,
    pub education: &'static str,
}

#[derive(Debug)]
pub struct TemplateStyle {
    pub kind: TemplateKind,
    pub display_name: &'static str,
    pub description: &'static str,
    pub class_prefix: &'static str,
    pub name_placeholder: &'static str,
    /// Shown when the CV has no title. `None` hides the role line entirely.
    pub role_placeholder: Option<&'static str>,
    pub date_separator: &'static str,
    /// Contacts inline in the header instead of a sidebar section.
    pub contacts_in_header: bool,
    pub sidebar: &'static [SectionKind],
    /// Sections at the top of the main column, before experience/education.
    pub main_lead: &'static [SectionKind],
    pub headings: Headings,
}

const NAME_PLACEHOLDER: &str = "Seu Nome";

static CLASSIC: TemplateStyle = TemplateStyle {
    kind: TemplateKind::Classic,
    display_name: "Clássico",
    description: "Top bar com foto circular",
    class_prefix: "classic",
    name_placeholder: NAME_PLACEHOLDER,
    role_placeholder: Some("Profissional Especializado"),
    date_separator: "–",
    contacts_in_header: true,
    sidebar: &[SectionKind::Summary, SectionKind::Skills],
    main_lead: &[],
    headings: Headings {
        summary: Some("Sobre Mim"),
        contacts: "Contactos",
        skills: "Habilidades",
        experience: "Experiência Profissional",
        education: "Formação Acadêmica",
    },
};

static MODERN: TemplateStyle = TemplateStyle {
    kind: TemplateKind::Modern,
    display_name: "Moderno",
    description: "Design executivo azul marinho",
    class_prefix: "modern",
    name_placeholder: NAME_PLACEHOLDER,
    role_placeholder: None,
    date_separator: "-",
    contacts_in_header: false,
    sidebar: &[SectionKind::Contacts, SectionKind::Skills],
    main_lead: &[SectionKind::Summary],
    headings: Headings {
        summary: Some("Sobre Mim"),
        contacts: "Contactos",
        skills: "Habilidades",
        experience: "Experiência Profissional",
        education: "Formação Académica",
    },
};

static MINIMALIST: TemplateStyle = TemplateStyle {
    kind: TemplateKind::Minimalist,
    display_name: "Minimalista",
    description: "Barra lateral azul profunda",
    class_prefix: "min",
    name_placeholder: NAME_PLACEHOLDER,
    role_placeholder: Some("Candidato Profissional"),
    date_separator: "–",
    contacts_in_header: false,
    sidebar: &[SectionKind::Contacts, SectionKind::Skills],
    main_lead: &[SectionKind::Summary],
    headings: Headings {
        summary: None,
        contacts: "Contacto",
        skills: "Especialidades",
        experience: "Experiência",
        education: "Formação",
    },
};

static TECHNICAL: TemplateStyle = TemplateStyle {
    kind: TemplateKind::Technical,
    display_name: "Criativo",
    description: "Gradientes e visual dinâmico",
    class_prefix: "creative",
    name_placeholder: NAME_PLACEHOLDER,
    role_placeholder: Some("Profissional Especializado"),
    date_separator: "-",
    contacts_in_header: false,
    sidebar: &[SectionKind::Contacts, SectionKind::Skills],
    main_lead: &[SectionKind::Summary],
    headings: Headings {
        summary: None,
        contacts: "Coordenadas",
        skills: "Qualidades",
        experience: "Experiências Profissionais",
        education: "Formações",
    },
};

/// Catalogue entry for template pickers.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn template_options() -> Vec<TemplateOption> {
    TemplateKind::ALL
        .iter()
        .map(|kind| {
            let style = kind.style();
            TemplateOption {
                id: kind.id(),
                name: style.display_name,
                description: style.description,
            }
        })
        .collect()
}
