//! Stopword lists for the keyword extractor.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static ENGLISH: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against", "all",
        "almost", "alone", "along", "already", "also", "although", "always", "am", "among",
        "amongst", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
        "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
        "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below",
        "beside", "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could",
        "did", "do", "does", "doing", "done", "down", "during", "each", "either", "else",
        "elsewhere", "enough", "etc", "even", "ever", "every", "everyone", "everything",
        "everywhere", "except", "few", "first", "for", "former", "formerly", "from", "further",
        "get", "gets", "got", "had", "has", "have", "having", "he", "hence", "her", "here",
        "hereafter", "hereby", "herein", "hers", "herself", "him", "himself", "his", "how",
        "however", "i", "if", "in", "indeed", "into", "is", "it", "its", "itself", "just",
        "last", "latter", "least", "less", "made", "make", "many", "may", "me", "meanwhile",
        "might", "mine", "more", "moreover", "most", "mostly", "much", "must", "my", "myself",
        "namely", "neither", "never", "nevertheless", "new", "next", "no", "nobody", "none",
        "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one",
        "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
        "over", "own", "per", "perhaps", "please", "put", "rather", "re", "read", "really",
        "same", "see", "seem", "seemed", "seeming", "seems", "several", "she", "should", "show",
        "since", "so", "some", "somehow", "someone", "something", "sometime", "sometimes",
        "somewhere", "still", "such", "take", "than", "that", "the", "their", "theirs", "them",
        "themselves", "then", "thence", "there", "thereafter", "thereby", "therefore", "therein",
        "thereupon", "these", "they", "this", "those", "though", "through", "throughout", "thru",
        "thus", "to", "together", "too", "toward", "towards", "under", "until", "up", "upon",
        "us", "use", "used", "using", "very", "via", "was", "we", "well", "were", "what",
        "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
        "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who",
        "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without",
        "would", "yet", "you", "your", "yours", "yourself", "yourselves", "it's", "don't",
        "doesn't", "isn't", "aren't", "can't", "won't", "we're", "you're", "they're", "i'm",
        "let's", "that's", "there's", "what's",
    ]
    .into_iter()
    .collect()
});

/// Stopwords for an ISO 639-1 language code, if bundled.
pub fn for_language(language: &str) -> Option<&'static HashSet<&'static str>> {
    match language.to_ascii_lowercase().as_str() {
        "en" | "english" => Some(&*ENGLISH),
        _ => None,
    }
}

/// The English list, used when a language is not bundled.
pub fn english() -> &'static HashSet<&'static str> {
    &*ENGLISH
}
