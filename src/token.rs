use rand::distributions::Alphanumeric;
use rand::Rng;

const TOKEN_LEN: usize = 6;

/// Short random alphanumeric token for cache-busting query parameters.
pub fn rand_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Appends a throwaway `<token>=1` query parameter so caches and CDNs
/// cannot serve a shared response for two related probes.
pub fn append_cache_buster(url: &str, token: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}=1", url, sep, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_fixed_length_alphanumeric() {
        let token = rand_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn successive_tokens_differ() {
        // 62^6 values; a collision here means the generator is broken.
        assert_ne!(rand_token(), rand_token());
    }

    #[test]
    fn cache_buster_starts_a_query_string() {
        let url = append_cache_buster("http://example.com/page", "Abc123");
        assert_eq!(url, "http://example.com/page?Abc123=1");
    }

    #[test]
    fn cache_buster_extends_an_existing_query_string() {
        let url = append_cache_buster("http://example.com/page?id=1", "Abc123");
        assert_eq!(url, "http://example.com/page?id=1&Abc123=1");
    }
}
