//! HS-code tariff lookup and keyword-driven classification.

use once_cell::sync::Lazy;

const DEFAULT_BASE_RATE: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TariffRule {
    pub prefix: String,
    pub base_rate: f64,
    pub product_name: String,
}

impl TariffRule {
    pub fn new(prefix: impl Into<String>, base_rate: f64, product_name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            base_rate,
            product_name: product_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TariffLookup {
    pub base_rate: f64,
    pub product_name: Option<String>,
}

/// Base duty rates by HS heading plus preferential rates by origin country.
#[derive(Debug, Clone)]
pub struct TariffSchedule {
    rules: Vec<TariffRule>,
    default_rate: f64,
    preferential: Vec<(String, f64)>,
}

impl TariffSchedule {
    pub fn new(rules: Vec<TariffRule>, default_rate: f64) -> Self {
        Self {
            rules,
            default_rate,
            preferential: Vec::new(),
        }
    }

    /// Registers a free-trade partner whose goods enter at `rate` percent.
    pub fn with_preferential(mut self, country: impl Into<String>, rate: f64) -> Self {
        self.preferential
            .push((country.into().trim().to_ascii_uppercase(), rate));
        self
    }

    /// Headings the assistant knows about, with the KORUS FTA for US origin.
    pub fn standard() -> Self {
        Self::new(
            vec![
                TariffRule::new("8471", 8.0, "Laptop computer"),
                TariffRule::new("6104", 13.0, "Women's cotton jacket"),
                TariffRule::new("9503", 8.0, "Toy"),
            ],
            DEFAULT_BASE_RATE,
        )
        .with_preferential("US", 0.0)
    }

    /// Longest matching prefix wins; unknown codes get the default rate.
    pub fn lookup(&self, hs_code: &str) -> TariffLookup {
        let code = hs_code.trim();
        self.rules
            .iter()
            .filter(|rule| code.starts_with(rule.prefix.as_str()))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| TariffLookup {
                base_rate: rule.base_rate,
                product_name: Some(rule.product_name.clone()),
            })
            .unwrap_or(TariffLookup {
                base_rate: self.default_rate,
                product_name: None,
            })
    }

    pub fn preferential_rate(&self, origin_country: &str) -> Option<f64> {
        let origin = origin_country.trim();
        self.preferential
            .iter()
            .find(|(country, _)| country.eq_ignore_ascii_case(origin))
            .map(|(_, rate)| *rate)
    }
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub hs_code: String,
    pub product_name: String,
}

struct KeywordRule {
    keywords: &'static [&'static str],
    hs_code: &'static str,
    product_name: &'static str,
}

static KEYWORD_RULES: Lazy<Vec<KeywordRule>> = Lazy::new(|| {
    vec![
        KeywordRule {
            keywords: &["electronic", "computer", "laptop", "전자", "컴퓨터"],
            hs_code: "8471.30.0000",
            product_name: "Laptop computer",
        },
        KeywordRule {
            keywords: &["clothing", "apparel", "garment", "jacket", "옷", "의류"],
            hs_code: "6104.32.0000",
            product_name: "Women's cotton jacket",
        },
    ]
});

const FALLBACK_HS_CODE: &str = "9503.00.3100";
const FALLBACK_PRODUCT: &str = "Toy";

/// Suggests an HS code from a free-text product description.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn classify(&self, description: &str) -> Classification {
        let haystack = description.to_lowercase();
        let rule = KEYWORD_RULES.iter().find(|rule| {
            rule.keywords
                .iter()
                .any(|keyword| haystack.contains(keyword))
        });
        match rule {
            Some(rule) => Classification {
                hs_code: rule.hs_code.to_string(),
                product_name: rule.product_name.to_string(),
            },
            None => Classification {
                hs_code: FALLBACK_HS_CODE.to_string(),
                product_name: FALLBACK_PRODUCT.to_string(),
            },
        }
    }
}
