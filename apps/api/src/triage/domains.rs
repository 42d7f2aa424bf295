//! Static domain-tag table.
//!
//! ORDER MATTERS: when two domains reach the same score the one listed first
//! wins. Keep broad traditions ahead of narrower ones.
//!
//! Keywords are matched as lowercase substrings, so avoid fragments that occur
//! inside common English words (e.g. "yin" matches "trying").

#[derive(Debug, Clone, Copy)]
pub struct DomainSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
    /// File name inside the knowledge directory.
    pub content_file: &'static str,
}

pub const DOMAINS: &[DomainSpec] = &[
    DomainSpec {
        id: "ayurveda",
        label: "Ayurveda",
        keywords: &[
            "ayurveda",
            "ayurvedic",
            "dosha",
            "vata",
            "pitta",
            "kapha",
            "prakriti",
            "vikriti",
            "triphala",
            "ashwagandha",
            "panchakarma",
            "abhyanga",
            "chyawanprash",
            "dinacharya",
        ],
        content_file: "ayurveda.md",
    },
    DomainSpec {
        id: "homeopathy",
        label: "Homeopathy",
        keywords: &[
            "homeopathy",
            "homeopathic",
            "homoeopathy",
            "arnica",
            "belladonna",
            "nux vomica",
            "materia medica",
            "mother tincture",
            "constitutional remedy",
            "potency",
        ],
        content_file: "homeopathy.md",
    },
    DomainSpec {
        id: "tcm",
        label: "Traditional Chinese Medicine",
        keywords: &[
            "traditional chinese medicine",
            "chinese herbs",
            "acupuncture",
            "acupressure",
            "qigong",
            "qi gong",
            "meridian",
            "moxibustion",
            "cupping",
            "yin and yang",
            "tongue diagnosis",
        ],
        content_file: "tcm.md",
    },
    DomainSpec {
        id: "unani",
        label: "Unani",
        keywords: &["unani", "hakim", "mizaj", "hijama", "humours", "tibb"],
        content_file: "unani.md",
    },
    DomainSpec {
        id: "siddha",
        label: "Siddha",
        keywords: &["siddha", "varmam", "kayakalpa", "thokkanam"],
        content_file: "siddha.md",
    },
    DomainSpec {
        id: "naturopathy",
        label: "Naturopathy",
        keywords: &[
            "naturopathy",
            "naturopathic",
            "hydrotherapy",
            "mud therapy",
            "fasting therapy",
            "nature cure",
            "detox diet",
        ],
        content_file: "naturopathy.md",
    },
    DomainSpec {
        id: "yoga",
        label: "Yoga & Meditation",
        keywords: &[
            "yoga",
            "asana",
            "pranayama",
            "meditation",
            "surya namaskar",
            "mudra",
            "kriya",
            "breathing exercise",
        ],
        content_file: "yoga.md",
    },
];
