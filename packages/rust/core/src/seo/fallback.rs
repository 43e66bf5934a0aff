//! Hard-coded fallback copy and keyword lists.
//!
//! The fallback layer is complete: it yields a value for every field of every
//! page key, so resolution can never come up empty.

use brokersite_shared::SiteConfig;

use super::page::{PageKey, SeoPage};
use super::schema;

// ---------------------------------------------------------------------------
// Keyword lists
// ---------------------------------------------------------------------------

pub const PRIMARY_KEYWORDS: &[&str] = &[
    "mortgage broker",
    "home loans",
    "mortgage refinancing",
    "first home buyer loans",
    "investment property loans",
];

pub const SECONDARY_KEYWORDS: &[&str] = &[
    "mortgage calculator",
    "home loan rates",
    "mortgage pre-approval",
    "refinance calculator",
    "mortgage advice",
    "loan comparison",
    "mortgage specialist",
];

pub const LOCAL_KEYWORDS: &[&str] = &[
    "Nepean mortgage broker",
    "Penrith mortgage services",
    "Blue Mountains home loans",
    "Western Sydney mortgage broker",
    "NSW mortgage specialist",
    "mortgage broker near me",
];

/// Questions used for FAQ markup when the feed has none.
pub const DEFAULT_FAQS: &[(&str, &str)] = &[
    (
        "What is a mortgage broker and how can they help me?",
        "A mortgage broker is a licensed professional who acts as an intermediary between you and potential lenders. They have access to multiple lenders and can help you find the best home loan rates and terms that suit your financial situation. Brokers can save you time and money by comparing options and handling the application process.",
    ),
    (
        "How much deposit do I need for a home loan?",
        "The deposit required varies depending on the lender and loan type. Generally, you'll need at least 5-20% of the property's purchase price as a deposit. First home buyers may be eligible for schemes that require lower deposits, and some lenders offer low deposit home loans with Lenders Mortgage Insurance (LMI).",
    ),
    (
        "What is the difference between fixed and variable interest rates?",
        "A fixed interest rate remains the same for a set period (usually 1-5 years), providing certainty in your repayments. A variable interest rate can change based on market conditions and lender decisions. Many borrowers choose a split loan with both fixed and variable portions to balance security and flexibility.",
    ),
    (
        "How long does the mortgage application process take?",
        "The mortgage application process typically takes 2-6 weeks from application to settlement, depending on the complexity of your situation and the lender's processing times. Pre-approval can be obtained in 1-3 days, which helps when making offers on properties.",
    ),
    (
        "What costs are involved in getting a home loan?",
        "Home loan costs may include application fees, valuation fees, legal fees, stamp duty, building and pest inspections, and ongoing fees like annual package fees. Your mortgage broker can provide a detailed breakdown of all costs involved in your specific situation.",
    ),
    (
        "Can I refinance my existing home loan?",
        "Yes, refinancing involves switching your existing home loan to a new lender or loan product, often to secure better interest rates, access equity, or change loan features. A mortgage broker can help you compare refinancing options and calculate potential savings.",
    ),
    (
        "What documents do I need for a home loan application?",
        "Common documents include payslips, tax returns, bank statements, employment contracts, identification documents, and details of assets and liabilities. Self-employed applicants may need additional documentation such as business financial statements and BAS statements.",
    ),
    (
        "Do mortgage brokers charge fees?",
        "Most mortgage brokers don't charge fees to borrowers as they receive commission from lenders when loans settle. However, some brokers may charge fees for complex situations or ongoing services. Always ask about fees upfront and ensure you understand the broker's remuneration structure.",
    ),
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Page labels
// ---------------------------------------------------------------------------

/// Short human label, used for breadcrumbs.
pub fn label(key: &PageKey) -> String {
    match key {
        PageKey::Home => "Home".into(),
        PageKey::About => "About".into(),
        PageKey::Services => "Services".into(),
        PageKey::Calculators => "Calculators".into(),
        PageKey::Contact => "Contact".into(),
        PageKey::Faq => "FAQ".into(),
        PageKey::PrivacyPolicy => "Privacy Policy".into(),
        PageKey::WebsitePolicy => "Website Policy".into(),
        PageKey::FeedbackAndComplaints => "Feedback and Complaints".into(),
        PageKey::NotFound => "Page Not Found".into(),
        PageKey::Custom(key) => {
            let label = title_case(key);
            if label.is_empty() { "Page".into() } else { label }
        }
    }
}

/// `first-home-buyers` → `First Home Buyers`.
fn title_case(key: &str) -> String {
    key.split(['-', '_', '/'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Fallback pages
// ---------------------------------------------------------------------------

const SITE_NAME: &str = "Nepean Mortgage";
const SITE_URL: &str = "https://nepeanmortgage.com.au";
const SITE_TITLE: &str = "Expert Mortgage Broker Services";
const SITE_DESCRIPTION: &str = "Professional mortgage broker services. Get expert advice on \
     home loans, refinancing, and investment property loans with competitive rates.";
const OG_IMAGE: &str = "/og-image.jpg";

/// `value` unless it is blank.
fn non_blank<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

/// Configured site keywords, or the primary list when none are set.
fn site_keywords(site: &SiteConfig) -> Vec<String> {
    let keywords: Vec<String> = site
        .default_keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .cloned()
        .collect();
    if keywords.is_empty() {
        owned(PRIMARY_KEYWORDS)
    } else {
        keywords
    }
}

/// `{site_url}/{segment}`, or `{site_url}/` for home.
pub fn canonical_url(site: &SiteConfig, key: &PageKey) -> String {
    format!(
        "{}/{}",
        non_blank(&site.url, SITE_URL).trim_end_matches('/'),
        key.path_segment()
    )
}

/// The complete fallback page for `key`. Blank site settings are replaced
/// with built-in copy so every field stays populated.
pub fn page(site: &SiteConfig, key: &PageKey) -> SeoPage {
    let name = non_blank(&site.name, SITE_NAME);

    let (title, description, keywords, h1): (String, String, Vec<String>, String) = match key {
        PageKey::Home => (
            "Expert Mortgage Broker Services in Nepean & Western Sydney".into(),
            "Professional mortgage broker services in Nepean. Get competitive home loan rates, \
             expert refinancing advice, and personalized mortgage solutions."
                .into(),
            PRIMARY_KEYWORDS
                .iter()
                .chain(LOCAL_KEYWORDS.iter().take(3))
                .map(|k| (*k).to_string())
                .collect(),
            "Professional Mortgage Broker Services in Nepean".into(),
        ),
        PageKey::About => (
            format!("About {name} - Your Trusted Mortgage Broker"),
            format!(
                "Learn about {name}'s experienced team of mortgage brokers. We provide \
                 personalized home loan solutions with access to multiple lenders and \
                 competitive rates."
            ),
            owned(&[
                "about mortgage broker",
                "mortgage broker experience",
                "loan specialist team",
            ]),
            format!("About {name}"),
        ),
        PageKey::Services => (
            "Mortgage Services - Home Loans, Refinancing & More".into(),
            "Comprehensive mortgage services including home loans, refinancing, investment \
             property loans, and first home buyer assistance."
                .into(),
            owned(&["mortgage services", "loan types"]),
            "Our Mortgage Services".into(),
        ),
        PageKey::Calculators => (
            "Mortgage Calculators - Loan Repayment & Refinancing Tools".into(),
            "Free mortgage calculators for loan repayments, refinancing savings, and borrowing \
             capacity. Plan your home loan with our easy-to-use financial tools."
                .into(),
            SECONDARY_KEYWORDS
                .iter()
                .filter(|k| k.contains("calculator"))
                .map(|k| (*k).to_string())
                .collect(),
            "Mortgage Calculators".into(),
        ),
        PageKey::Contact => (
            format!("Contact {name} - Get Your Free Consultation"),
            format!(
                "Contact {name} for expert mortgage advice. Book your free consultation today \
                 and discover how we can help you secure the best home loan."
            ),
            owned(&[
                "contact mortgage broker",
                "mortgage consultation",
                "mortgage advice",
            ]),
            "Contact Us".into(),
        ),
        PageKey::Faq => (
            "Mortgage FAQ - Common Home Loan Questions Answered".into(),
            "Get answers to frequently asked questions about mortgages, home loans, refinancing, \
             and the mortgage application process from our expert brokers."
                .into(),
            owned(&["mortgage FAQ", "home loan questions", "mortgage process"]),
            "Frequently Asked Questions".into(),
        ),
        PageKey::PrivacyPolicy => (
            "Privacy Policy".into(),
            format!(
                "Privacy policy for {name}. Learn how we collect, use, and protect your personal \
                 information when using our mortgage broker services."
            ),
            owned(&["privacy policy", "personal information", "mortgage broker privacy"]),
            "Privacy Policy".into(),
        ),
        PageKey::WebsitePolicy => (
            "Website Policy".into(),
            format!(
                "Website terms and conditions for {name}. Important information about using our \
                 website and mortgage broker services."
            ),
            owned(&["website policy", "terms and conditions", "website terms"]),
            "Website Policy".into(),
        ),
        PageKey::FeedbackAndComplaints => (
            "Feedback and Complaints".into(),
            "Submit feedback or complaints about our mortgage broker services. We're committed \
             to resolving any issues and improving our service."
                .into(),
            owned(&["feedback", "complaints", "mortgage broker complaints"]),
            "Feedback and Complaints".into(),
        ),
        PageKey::NotFound => (
            "Page Not Found".into(),
            "The page you are looking for could not be found.".into(),
            site_keywords(site),
            "Page Not Found".into(),
        ),
        PageKey::Custom(_) => (
            format!("{name} - {}", non_blank(&site.default_title, SITE_TITLE)),
            non_blank(&site.default_description, SITE_DESCRIPTION).to_string(),
            site_keywords(site),
            label(key),
        ),
    };

    SeoPage {
        title,
        description,
        keywords,
        canonical_url: canonical_url(site, key),
        og_image: non_blank(&site.og_image.url, OG_IMAGE).to_string(),
        og_type: "website".into(),
        h1,
        structured_data: schema::page_schemas(site, key, None),
        no_index: matches!(key, PageKey::NotFound),
        no_follow: false,
    }
}
