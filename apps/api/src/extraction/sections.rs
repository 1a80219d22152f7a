//! Splits extracted resume text into the sections the rewriter and renderer work with.
//!
//! Plain text carries no font information, so a line counts as a heading only
//! when, once normalized, it is exactly one of the names below.

use crate::models::resume::ResumeSections;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Header,
    Summary,
    Experience,
    Education,
    Skills,
    Additional,
}

const SUMMARY_HEADINGS: &[&str] = &[
    "SUMMARY",
    "PROFESSIONAL SUMMARY",
    "CAREER SUMMARY",
    "PROFILE",
    "PROFESSIONAL PROFILE",
    "OBJECTIVE",
    "CAREER OBJECTIVE",
    "ABOUT",
    "ABOUT ME",
];

const EXPERIENCE_HEADINGS: &[&str] = &[
    "EXPERIENCE",
    "PROFESSIONAL EXPERIENCE",
    "WORK EXPERIENCE",
    "RELEVANT EXPERIENCE",
    "EMPLOYMENT",
    "EMPLOYMENT HISTORY",
    "WORK HISTORY",
    "CAREER HISTORY",
];

const EDUCATION_HEADINGS: &[&str] = &[
    "EDUCATION",
    "ACADEMIC BACKGROUND",
    "EDUCATION AND TRAINING",
    "EDUCATION & TRAINING",
];

const SKILLS_HEADINGS: &[&str] = &[
    "SKILLS",
    "TECHNICAL SKILLS",
    "CORE SKILLS",
    "KEY SKILLS",
    "CORE COMPETENCIES",
    "COMPETENCIES",
    "TECHNOLOGIES",
    "SKILLS & TOOLS",
    "SKILLS AND TOOLS",
];

const ADDITIONAL_HEADINGS: &[&str] = &[
    "PROJECTS",
    "PERSONAL PROJECTS",
    "CERTIFICATIONS",
    "CERTIFICATES",
    "AWARDS",
    "ACHIEVEMENTS",
    "PUBLICATIONS",
    "LANGUAGES",
    "INTERESTS",
    "VOLUNTEERING",
    "VOLUNTEER EXPERIENCE",
];

const BULLET_MARKERS: &[char] = &['•', '●', '▪', '◦', '‣', '–', '-', '*', '·'];

/// Parses normalized resume text into sections.
///
/// Lines before the first heading form the header. A resume without any
/// recognised heading keeps its first line as the header and the rest as summary.
pub fn parse_sections(text: &str) -> ResumeSections {
    let mut buckets: Vec<(SectionKind, Vec<&str>)> = vec![(SectionKind::Header, Vec::new())];

    for line in text.lines() {
        let line = line.trim();
        match classify_heading(line) {
            Some(kind) => buckets.push((kind, Vec::new())),
            None => {
                if let Some((_, lines)) = buckets.last_mut() {
                    lines.push(line);
                }
            }
        }
    }

    let mut sections = ResumeSections::default();

    if buckets.len() == 1 {
        let mut lines = buckets[0].1.iter().filter(|l| !l.is_empty());
        if let Some(first) = lines.next() {
            sections.header.push((*first).to_string());
        }
        sections.summary = join_paragraph(lines.copied());
        return sections;
    }

    for (kind, lines) in buckets {
        match kind {
            SectionKind::Header => sections.header.extend(
                lines
                    .iter()
                    .filter(|l| !l.is_empty())
                    .map(|l| l.to_string()),
            ),
            SectionKind::Summary => {
                let paragraph = join_paragraph(lines.iter().copied());
                if !paragraph.is_empty() {
                    if !sections.summary.is_empty() {
                        sections.summary.push(' ');
                    }
                    sections.summary.push_str(&paragraph);
                }
            }
            SectionKind::Experience => sections.experience.extend(group_items(&lines)),
            SectionKind::Education => sections.education.extend(group_items(&lines)),
            SectionKind::Additional => sections.additional.extend(group_items(&lines)),
            SectionKind::Skills => sections.skills.extend(split_skills(&lines)),
        }
    }

    sections
}

fn classify_heading(line: &str) -> Option<SectionKind> {
    if line.is_empty() || line.len() > 40 {
        return None;
    }
    let normalized = line
        .trim_end_matches(':')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    let table: [(&[&str], SectionKind); 5] = [
        (SUMMARY_HEADINGS, SectionKind::Summary),
        (EXPERIENCE_HEADINGS, SectionKind::Experience),
        (EDUCATION_HEADINGS, SectionKind::Education),
        (SKILLS_HEADINGS, SectionKind::Skills),
        (ADDITIONAL_HEADINGS, SectionKind::Additional),
    ];
    table
        .iter()
        .find(|(names, _)| names.contains(&normalized.as_str()))
        .map(|(_, kind)| *kind)
}

fn strip_bullet(line: &str) -> Option<&str> {
    let stripped = line.trim_start_matches(BULLET_MARKERS);
    (stripped.len() != line.len()).then(|| stripped.trim())
}

fn join_paragraph<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .map(|l| strip_bullet(l).unwrap_or(l).trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Groups lines into entries: a blank line or a bullet marker starts a new
/// entry, any other line continues the current one.
fn group_items(lines: &[&str]) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, items: &mut Vec<String>| {
        if !current.trim().is_empty() {
            items.push(current.trim().to_string());
        }
        current.clear();
    };

    for line in lines {
        if line.is_empty() {
            flush(&mut current, &mut items);
            continue;
        }
        match strip_bullet(line) {
            Some(rest) => {
                flush(&mut current, &mut items);
                current.push_str(rest);
            }
            None => {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(line);
            }
        }
    }
    flush(&mut current, &mut items);
    items
}

/// Splits skill lines on common separators and drops leading "Label:" prefixes.
fn split_skills(lines: &[&str]) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for line in lines {
        let line = strip_bullet(line).unwrap_or(line);
        let line = match line.rsplit_once(':') {
            Some((_, rest)) if !rest.trim().is_empty() => rest,
            _ => line,
        };
        for part in line.split([',', ';', '|', '•', '·']) {
            let skill = part.trim();
            if skill.is_empty() {
                continue;
            }
            if !skills.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
                skills.push(skill.to_string());
            }
        }
    }
    skills
}
