//! Post text for the ranked list: the top three in the main post, ranks four
//! and five in the threaded reply.
use callboard_feed::RankedToken;
use rand::Rng;
use rand::seq::SliceRandom;

pub const INTROS: [&str; 4] = [
    "🚀Top 5 Most 📞 1h\n\n",
    "🔥Hottest calls last hour\n\n",
    "📈Most called tokens (1h)\n\n",
    "🎯Top performers - 1h calls\n\n",
];

pub const HASHTAG_SETS: [&str; 4] = [
    "#SOL #Outlight #TokenCalls",
    "#Solana #DeFi #CryptoAnalysis",
    "#SOL #Crypto #Signals",
    "#SolanaEcosystem #TokenTracking #DeFi",
];

pub const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

pub const ATTRIBUTION: &str = "🧪 Data from: 🔗 https://outlight.fun/";

/// Publishing API limit, in characters.
pub const POST_CHAR_LIMIT: usize = 280;

const MAIN_COUNT: usize = 3;
const REPLY_RANKS: [&str; 2] = ["4.", "5."];

fn token_block(marker: &str, token: &RankedToken) -> String {
    format!(
        "{marker} ${}\n{}\n📞 {}\n\n",
        token.symbol, token.address, token.filtered_calls
    )
}

/// Main post with a randomly chosen intro.
pub fn main_post<R: Rng + ?Sized>(tokens: &[RankedToken], rng: &mut R) -> String {
    let intro = INTROS.choose(rng).copied().unwrap_or(INTROS[0]);
    main_post_with_intro(intro, tokens)
}

/// Main post with a fixed intro; only the first three tokens are rendered.
pub fn main_post_with_intro(intro: &str, tokens: &[RankedToken]) -> String {
    let mut text = String::from(intro);
    for (medal, token) in MEDALS.iter().zip(tokens.iter().take(MAIN_COUNT)) {
        text.push_str(&token_block(medal, token));
    }
    let mut text = text.trim_end_matches('\n').to_string();
    text.push('\n');
    text
}

/// Reply post with a randomly chosen hashtag set.
pub fn reply_post<R: Rng + ?Sized>(tokens: &[RankedToken], rng: &mut R) -> String {
    let hashtags = HASHTAG_SETS.choose(rng).copied().unwrap_or(HASHTAG_SETS[0]);
    reply_post_with_hashtags(hashtags, tokens)
}

/// Reply post for ranks four and five of `tokens`, closed by the attribution
/// line and `hashtags` even when there is nothing to continue.
pub fn reply_post_with_hashtags(hashtags: &str, tokens: &[RankedToken]) -> String {
    let mut text = String::new();
    for (rank, token) in REPLY_RANKS.iter().zip(tokens.iter().skip(MAIN_COUNT)) {
        text.push_str(&token_block(rank, token));
    }
    text.push_str(ATTRIBUTION);
    text.push('\n');
    text.push_str(hashtags);
    text.push(' ');
    text.trim().to_string()
}

pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn exceeds_limit(text: &str) -> bool {
    char_count(text) > POST_CHAR_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tokens(n: usize) -> Vec<RankedToken> {
        (0..n)
            .map(|i| RankedToken::new(format!("T{i}"), format!("addr{i}"), 10 - i))
            .collect()
    }

    #[test]
    fn main_post_renders_top_three_with_medals() {
        let text = main_post_with_intro(INTROS[1], &tokens(5));
        assert_eq!(
            text,
            "🔥Hottest calls last hour\n\n\
             🥇 $T0\naddr0\n📞 10\n\n\
             🥈 $T1\naddr1\n📞 9\n\n\
             🥉 $T2\naddr2\n📞 8\n"
        );
    }

    #[test]
    fn main_post_with_single_token() {
        let text = main_post_with_intro(INTROS[0], &tokens(1));
        assert_eq!(text, "🚀Top 5 Most 📞 1h\n\n🥇 $T0\naddr0\n📞 10\n");
    }

    #[test]
    fn main_post_is_deterministic_for_a_seed() {
        let list = tokens(3);
        let a = main_post(&list, &mut StdRng::seed_from_u64(7));
        let b = main_post(&list, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(INTROS.iter().any(|intro| a.starts_with(intro)));
    }

    #[test]
    fn reply_post_continues_at_rank_four() {
        let text = reply_post_with_hashtags(HASHTAG_SETS[2], &tokens(5));
        assert_eq!(
            text,
            "4. $T3\naddr3\n📞 7\n\n\
             5. $T4\naddr4\n📞 6\n\n\
             🧪 Data from: 🔗 https://outlight.fun/\n#SOL #Crypto #Signals"
        );
    }

    #[test]
    fn reply_post_keeps_attribution_without_continuation() {
        for n in 0..=4 {
            let mut rng = StdRng::seed_from_u64(n as u64);
            let text = reply_post(&tokens(n), &mut rng);
            assert!(text.contains(ATTRIBUTION), "{n} tokens: {text}");
            assert!(HASHTAG_SETS.iter().any(|h| text.ends_with(h)));
            assert_eq!(text, text.trim());
        }
        assert_eq!(
            reply_post_with_hashtags(HASHTAG_SETS[0], &[]),
            "🧪 Data from: 🔗 https://outlight.fun/\n#SOL #Outlight #TokenCalls"
        );
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let emoji = "🚀".repeat(POST_CHAR_LIMIT);
        assert!(!exceeds_limit(&emoji));
        assert!(exceeds_limit(&format!("{emoji}!")));
    }
}
