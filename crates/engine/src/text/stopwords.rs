//! Stopword list
//!
//! Standard English function words plus academic discourse words that
//! carry no topical signal in titles and abstracts. The list is fixed;
//! growing it changes every downstream vector.

use std::collections::HashSet;
use std::sync::OnceLock;

pub const STOPWORDS: &[&str] = &[
    // English function words
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no",
    "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "upon", "very", "via", "was",
    "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "within", "without", "would", "you", "your", "yours", "yourself", "yourselves",
    // Academic discourse words
    "abstract", "achieve", "achieves", "analysis", "approach", "approaches", "art", "based",
    "baseline", "baselines", "benchmark", "benchmarks", "demonstrate", "demonstrated",
    "demonstrates", "effective", "effectiveness", "evaluate", "evaluated", "evaluation",
    "experiment", "experimental", "experiments", "framework", "improve", "improved",
    "improvement", "improvements", "improves", "introduce", "introduced", "introduces", "method",
    "methods", "model", "models", "novel", "outperform", "outperforms", "paper", "papers",
    "perform", "performance", "performs", "present", "presented", "presents", "problem",
    "problems", "propose", "proposed", "proposes", "result", "results", "show", "showed", "shown",
    "shows", "significantly", "state", "study", "studies", "task", "tasks", "technique",
    "techniques", "use", "used", "uses", "using", "work", "works",
];

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

pub fn is_stopword(token: &str) -> bool {
    stopword_set().contains(token)
}
