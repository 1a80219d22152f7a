// Word lists used by the keyword extractor. All entries are lower-case.

/// English function words plus job-posting filler that never makes a useful keyword.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "again", "against", "all", "also", "am", "an",
    "and", "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
    "during", "each", "either", "etc", "every", "few", "for", "from", "further", "had", "has",
    "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "itself", "just", "may", "me", "might", "more", "most", "must", "my",
    "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours",
    "out", "over", "own", "per", "same", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "within",
    "without", "would", "you", "your", "yours",
    // job-posting filler
    "ability", "able", "applicant", "applicants", "apply", "candidate", "candidates",
    "excellent", "experience", "experienced", "good", "great", "ideal", "ideally", "join",
    "looking", "new", "plus", "position", "preferred", "required", "requirements",
    "responsibilities", "role", "seeking", "strong", "using", "well", "work", "working",
    "year", "years",
];

/// Known skills, in their canonical spelling. Matched case-insensitively on token boundaries.
pub const SKILL_LEXICON: &[&str] = &[
    "Python",
    "Java",
    "JavaScript",
    "TypeScript",
    "SQL",
    "AWS",
    "Azure",
    "GCP",
    "Rust",
    "Golang",
    "C++",
    "C#",
    "Ruby",
    "Kotlin",
    "Swift",
    "Scala",
    "PHP",
    "Docker",
    "Kubernetes",
    "Terraform",
    "Linux",
    "Git",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "Redis",
    "Kafka",
    "GraphQL",
    "REST",
    "gRPC",
    "React",
    "Node.js",
    "Django",
    "Spring",
    "CI/CD",
    "microservices",
    "distributed systems",
    "system design",
    "cloud computing",
    "machine learning",
    "deep learning",
    "data analysis",
    "data engineering",
    "project management",
    "agile",
    "scrum",
    "leadership",
    "communication",
    "mentoring",
];

/// Phrases that mark a sentence as a hard requirement.
pub const REQUIREMENT_INDICATORS: &[&str] = &[
    "required",
    "must have",
    "minimum",
    "qualification",
    "experience in",
    "knowledge of",
    "familiarity with",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}
