//! Keyword and symbol tables used by the heuristic intent classifier.
//!
//! Keywords are matched against text that has already been decomposed,
//! stripped of diacritics and lower-cased, so Swedish entries are written
//! without accents (`vad ar`, `portfolj`).

/// Upper-case tokens that look like tickers but are currency codes,
/// institutions or common acronyms.
pub const STOP_SYMBOLS: &[&str] = &[
    "USD", "USDT", "EUR", "GBP", "SEK", "NOK", "DKK", "CHF", "JPY", "AUD", "CAD", "NZD", "US",
    "EU", "UK", "GDP", "CPI", "PMI", "FOMC", "FED", "ECB", "SEC", "BOJ", "IMF", "CEO", "CFO",
    "EPS", "ETF", "ETN", "IPO", "API", "AI", "LLM", "RAG", "YTD", "YOY", "QOQ",
];

/// Tickers accepted even when written in lower case or as two letters.
pub const KNOWN_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "TSLA", "AMZN", "GOOG", "GOOGL", "META", "NFLX", "AMD", "INTC",
    "SMCI", "SPY", "QQQ", "IWM", "DIA", "BTC", "ETH", "SOL", "XRP", "ADA", "DOGE", "BNB", "AVAX",
    "DOT", "LINK", "MATIC", "GE", "GM", "F", "T", "V", "MA", "C", "X", "VOLV_B", "VOLV-B",
    "VOLV-B.ST", "ERIC_B", "ERIC-B", "ERIC-B.ST", "ASSA_B", "ASSA-B", "ASSA-B.ST", "SEB_A",
    "SEB-A", "SEB-A.ST", "SWED_A", "SWED-A", "SWED-A.ST", "SAND", "SAND.ST",
];

/// Prefixes recognised in `EXCHANGE:TICKER` tokens.
pub const EXCHANGE_PREFIXES: &[&str] = &[
    "CRYPTO", "BINANCE", "COINBASE", "NASDAQ", "NYSE", "AMEX", "OMX", "STO", "LSE", "XETRA",
    "TSX",
];

pub const INDEX_KEYWORDS: &[&str] = &[
    "s&p 500", "sp500", "sp 500", "nasdaq", "nasdaq 100", "dow", "dow jones", "dax", "ftse",
    "omx", "omxs30", "stoxx", "vix",
];

pub const COMMODITY_KEYWORDS: &[&str] = &[
    "gold", "silver", "oil", "brent", "wti", "natural gas", "copper", "guld", "olja", "gas",
];

pub const ASSET_KEYWORDS: &[&str] = &[
    "btc", "bitcoin", "eth", "ethereum", "sol", "solana", "xrp", "ada", "cardano", "doge",
    "dogecoin", "bnb", "avax", "dot", "matic", "link", "apple", "tesla", "nvidia", "microsoft",
    "amazon", "google", "meta", "netflix", "crypto", "krypto", "stock", "stocks", "aktie",
    "aktier", "equity", "equities", "share", "shares", "etf", "forex", "fx", "index", "commodity",
    "futures", "terminer",
];

pub const NEWS_KEYWORDS: &[&str] = &[
    "news", "headline", "sentiment", "earnings", "macro", "report", "filing", "sec", "press",
    "rates", "nyhet", "nyheter", "rubrik", "rapport", "pressmeddelande", "ranta", "inflation",
];

pub const TECH_KEYWORDS: &[&str] = &[
    "chart", "technical", "trend", "support", "resistance", "rsi", "macd", "moving average",
    "pattern", "levels", "price", "volatility", "price action", "diagram", "graf", "teknisk",
    "stod", "motstand", "kurs", "pris", "niva", "nivaer",
];

pub const SIGNAL_KEYWORDS: &[&str] = &[
    "signal", "signals", "scan", "setup", "alert", "indicator", "overbought", "oversold",
    "signaler", "overkop", "oversald",
];

pub const KNOWLEDGE_KEYWORDS: &[&str] = &[
    "what is", "explain", "define", "strategy", "risk management", "portfolio", "allocation",
    "mean reversion", "momentum", "value investing", "growth investing", "pattern", "vad ar",
    "forklara", "definiera", "strategi", "riskhantering", "portfolj", "allokering",
];

// "i " keeps its trailing space so it is matched as a phrase, not a letter.
pub const MEMORY_KEYWORDS: &[&str] = &[
    "my", "me", "i ", "we", "our", "portfolio", "risk", "horizon", "preference", "constraint",
    "min", "mina", "mig", "min portfolj", "min profil", "min risk",
];

pub const PORTFOLIO_KEYWORDS: &[&str] = &[
    "portfolio", "holdings", "positions", "exposure", "allocation", "balance", "pnl", "profit",
    "loss", "portfolj", "innehav", "positioner", "exponering", "allokering", "balans", "vinst",
    "forlust",
];

pub const FRESH_KEYWORDS: &[&str] = &[
    "latest", "today", "recent", "this week", "this month", "update", "breaking", "now",
    "senaste", "idag", "nyss", "denna vecka", "denna veckan", "denna manad", "just nu",
];

pub const SOURCE_KEYWORDS: &[&str] = &[
    "source", "sources", "citation", "cite", "report", "study", "paper", "kalla", "kallor",
];

pub const TRADE_KEYWORDS: &[&str] = &[
    "buy", "sell", "long", "short", "enter", "exit", "trim", "add", "reduce", "close", "open",
    "position", "allocate", "allocation", "rebalance", "trade", "kop", "kopa", "salj", "salja",
    "langa", "korta", "stang", "oppna", "rebalansera",
];

pub const ANALYSIS_KEYWORDS: &[&str] = &[
    "analyze", "analysis", "outlook", "view", "thoughts", "opinion", "idea", "setup",
    "recommendation", "forecast", "thesis", "should i", "analys", "analysera", "utsikt",
    "tankar", "syn", "borde jag", "ska jag", "bor jag",
];

pub const COMPARE_KEYWORDS: &[&str] = &["compare", "vs", "versus", "jamfor", "mot", "kontra"];

pub const QUICK_QUESTION_PHRASES: &[&str] = &[
    "what is", "explain", "define", "difference between", "how does", "how to", "meaning of",
    "why is", "vad ar", "vad betyder", "hur fungerar", "forklara", "definiera", "skillnad mellan",
];

pub(crate) fn is_stop_symbol(candidate: &str) -> bool {
    STOP_SYMBOLS.contains(&candidate)
}

pub(crate) fn is_known_ticker(candidate: &str) -> bool {
    KNOWN_TICKERS.contains(&candidate)
}
