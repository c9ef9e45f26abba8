//! Default values for configuration

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("MEMVAULT_EMBEDDING_URL").unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

/// Default embedding dimension (text-embedding-004)
pub fn default_embedding_dimension() -> usize {
    768
}

/// Default cap on characters sent to the embedding model
pub fn default_embedding_max_input_chars() -> usize {
    8000
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default: generation enabled
pub fn default_generation_enabled() -> bool {
    true
}

/// Default text generation backend URL
pub fn default_generation_backend_url() -> String {
    std::env::var("MEMVAULT_GENERATION_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7998".to_string())
}

/// Default text generation model
pub fn default_generation_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Default generation request timeout in seconds
pub fn default_generation_timeout() -> u64 {
    60
}

/// Default characters of content included in analysis prompts
pub fn default_generation_max_prompt_chars() -> usize {
    12_000
}

/// Content longer than this many characters is relocated to blob storage
pub fn default_content_threshold_chars() -> usize {
    32_000
}

/// Maximum number of candidates fetched per search
pub fn default_fetch_cap() -> usize {
    1000
}

/// Default number of search results
pub fn default_search_k() -> usize {
    10
}

/// Default minimum similarity score
pub fn default_search_min_score() -> f32 {
    -1.0
}

/// Default: relationship expansion disabled
pub fn default_expand_relationships() -> bool {
    false
}

pub fn default_weight_patterns() -> f32 {
    0.2
}

pub fn default_weight_insights() -> f32 {
    0.2
}

pub fn default_weight_complexity() -> f32 {
    0.2
}

pub fn default_weight_maintainability() -> f32 {
    0.3
}

pub fn default_weight_summary() -> f32 {
    0.1
}

pub fn default_complexity_scale() -> f32 {
    10.0
}

pub fn default_maintainability_scale() -> f32 {
    100.0
}

pub fn default_summary_min_chars() -> usize {
    50
}

/// Complexity assumed when the analysis could not be parsed
pub fn default_fallback_complexity() -> f32 {
    5.0
}

/// Maintainability assumed when the analysis could not be parsed
pub fn default_fallback_maintainability() -> f32 {
    50.0
}

/// Attempts per reverse edge before it is dropped
pub fn default_relationship_max_attempts() -> u32 {
    5
}

/// Default minimum intent confidence (any hit counts)
pub fn default_intent_min_confidence() -> f32 {
    0.0
}
