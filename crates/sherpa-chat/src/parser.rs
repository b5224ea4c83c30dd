//! Rule-based utterance parser.
//!
//! Recognises which capability an utterance asks for and pulls out the
//! arguments it carries: the vehicle model and the address to search near.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sherpa_core::types::Capability;

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

struct IntentPatterns {
    /// Something is wrong with the car.
    trouble: Vec<Regex>,
    /// The user is asking something.
    question: Vec<Regex>,
    /// The utterance is about the car at all.
    vehicle: Vec<Regex>,
    /// The user wants a place located.
    locate: Vec<Regex>,
    charger: Vec<Regex>,
    service: Vec<Regex>,
    hyundai: Regex,
    kia: Regex,
}

static INTENT_PATTERNS: LazyLock<IntentPatterns> = LazyLock::new(|| {
    let mk = |pats: &[&str]| -> Vec<Regex> {
        pats.iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect()
    };

    IntentPatterns {
        trouble: mk(&[
            r"(?i)\b(?:won['’]?t|will\s+not|doesn['’]?t|does\s+not|isn['’]?t|is\s+not|can['’]?t|cannot|didn['’]?t)\b",
            r"(?i)\bnot\s+(?:working|charging|starting|turning|responding|connecting|holding)\b",
            r"(?i)\b(?:stopped|broken|broke|faulty|fault|fail(?:ed|s|ing|ure)?|problems?|issues?|errors?)\b",
            r"(?i)\b(?:warning|noise|noisy|leak(?:ing|s)?|drain(?:ing|s|ed)?|dead|flat|stuck|overheat(?:ing|s|ed)?)\b",
            r"(?i)\b(?:flashing|blinking|beeping|rattl(?:e|ing)|squeak(?:s|ing)?)\b",
        ]),
        question: mk(&[
            r"\?",
            r"(?i)\b(?:how|what|why|when|which|where)\b",
            r"(?i)\b(?:can|should|do|must)\s+i\b",
            r"(?i)\b(?:explain|tell\s+me|help|advice|recommend(?:ed)?)\b",
        ]),
        vehicle: mk(&[
            r"(?i)\b(?:my|the|our|this)\s+(?:car|ev|vehicle|electric\s+car)\b",
            r"(?i)\b(?:hyundai|kia|kona|ioniq|niro|e-?niro|ev\s*-?\s*6)\b",
            r"(?i)\b(?:batter(?:y|ies)|charg(?:e|es|ed|ing)|chargers?|range|regen(?:erative)?)\b",
            r"(?i)\b(?:tyres?|tires?|brakes?|dashboard|infotainment|headlights?|wipers?|fuse|12\s*v|coolant)\b",
            r"(?i)\b(?:heat\s+pump|climate|air\s+con(?:ditioning)?|key\s+fob|airbags?|seats?|mirrors?|steering)\b",
            r"(?i)\b(?:software\s+update|error\s+code|maintenance|motor|inverter|odometer|boot|trunk|frunk|doors?)\b",
            r"(?i)\b(?:cruise\s+control|lane\s+(?:keeping|assist)|parking\s+assist|v2l|vehicle[-\s]to[-\s]load)\b",
            r"(?i)\bwarning\s+lights?\b",
            r"(?i)\b(?:owner['’]?s\s+)?manual\b",
        ]),
        locate: mk(&[
            r"(?i)\b(?:nearest|nearby|closest|near|close\s+(?:by|to))\b",
            r"(?i)\baround\s+(?:me|here)\b",
            r"(?i)\bwhere\s+(?:can|could|should|do)\s+i\s+(?:find|get|go|charge|recharge|take)\b",
            r"(?i)\bwhere['’]?s\s+(?:the|a)\b",
            r"(?i)\b(?:find|locate|directions?\s+to|look(?:ing)?\s+for|search\s+for|show\s+me|list)\b",
        ]),
        charger: mk(&[
            r"(?i)\b(?:super)?chargers?\b",
            r"(?i)\bcharging\s+(?:stations?|points?|spots?|locations?|hubs?|places?|bays?)\b",
            r"(?i)\bplaces?\s+to\s+(?:re)?charge\b",
            r"(?i)\bwhere\s+(?:can|could|do|should)\s+i\s+(?:re)?charge\b",
            r"(?i)\b(?:re)?charge\s+(?:near|around|close\s+to)\b",
        ]),
        service: mk(&[
            r"(?i)\bservice\s+(?:centres?|centers?|stations?|shops?|points?|garages?|locations?)\b",
            r"(?i)\bdealer(?:s|ships?)?\b",
            r"(?i)\b(?:repair|body)\s+(?:shops?|centres?|centers?)\b",
            r"(?i)\b(?:workshops?|garages?|mechanics?)\b",
            r"(?i)\b(?:get|have|take)\s+(?:my|the|it)\s+(?:\w+\s+){0,3}?(?:serviced|repaired|fixed|checked)\b",
        ]),
        hyundai: Regex::new(r"(?i)\bhyundai\b").expect("Invalid make regex"),
        kia: Regex::new(r"(?i)\bkia\b").expect("Invalid make regex"),
    }
});

/// Recognised models, most specific first.
struct ModelPattern {
    canonical: &'static str,
    re: Regex,
}

static MODEL_PATTERNS: LazyLock<Vec<ModelPattern>> = LazyLock::new(|| {
    [
        ("Hyundai Kona Electric", r"(?i)\bkona\b"),
        ("Hyundai Ioniq 5", r"(?i)\bioniq\s*-?\s*5\b"),
        ("Hyundai Ioniq 6", r"(?i)\bioniq\s*-?\s*6\b"),
        ("Hyundai Ioniq", r"(?i)\bioniq\b"),
        ("Kia Niro Electric", r"(?i)\be?-?niro\b"),
        ("Kia EV6", r"(?i)\bev\s*-?\s*6\b"),
    ]
    .into_iter()
    .map(|(canonical, p)| ModelPattern {
        canonical,
        re: Regex::new(p).expect("Invalid model regex"),
    })
    .collect()
});

// Explicit statements of where the user is.
static SELF_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:my\s+(?:home\s+|current\s+)?address\s+is|i\s*(?:['’]m|am)\s+(?:currently\s+|now\s+)?(?:at|in|near|on)|i\s+live\s+(?:at|in|on|near))\s+",
    )
    .expect("Invalid address regex")
});

// Prepositions that introduce a location.
static ADDRESS_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:nearest|closest)\s+(?:[\w'’-]+\s+){0,4}?to|near(?:\s+to)?|around|close\s+to|in|at)\s+",
    )
    .expect("Invalid address regex")
});

// Phrases after "in" or "at" that name a time rather than a place.
static TIME_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:",
        r"(?:the\s+)?(?:morning|afternoon|evening|night|weekend|moment|meantime|end|future|same\s+time)",
        r"|(?:a|an|one|two|three|a\s+few|a\s+couple\s+of|\d+)\s+(?:seconds?|minutes?|mins?|hours?|hrs?|days?|weeks?|months?)",
        r"|night|noon|midnight|dawn|dusk|once|least|all|first|last|times?|some\s+point|tonight|tomorrow",
        r"|(?:this|tomorrow)\s+(?:morning|afternoon|evening|night|weekend)",
        r"|\d{1,2}(?:[:.]\d{2})?\s*(?:am|pm|o['’]?clock)",
        r")$",
    ))
    .expect("Invalid time regex")
});

// Replies to an address question that are not an address.
static NOT_A_PLACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:i|i['’]m|i['’]d|you|we|it|it['’]s|this|that|they|he|she|no|nope|yes|yeah|ok|okay|sure|never\s*mind|cancel|stop|nothing|dunno|don['’]t|not|tell|show|give|help|thanks|thank|hello|hi|hey)\b",
    )
    .expect("Invalid address regex")
});

// A make followed by a model name, for models outside the supported list.
static MAKE_MODEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:hyundai|kia)\s+[\w-]+(?:\s+[\w-]+){0,2}$").expect("Invalid model regex")
});

/// Locations that name no place.
static VAGUE_LOCATIONS: &[&str] = &[
    "me",
    "here",
    "you",
    "home",
    "my home",
    "my house",
    "my place",
    "my location",
    "my current location",
    "current location",
    "my position",
    "my area",
    "this area",
    "the area",
    "around here",
    "where i am",
    "range",
];

// =============================================================================
// Make
// =============================================================================

/// Vehicle manufacturers with service-centre lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Make {
    Hyundai,
    Kia,
}

impl fmt::Display for Make {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Make::Hyundai => f.write_str("Hyundai"),
            Make::Kia => f.write_str("Kia"),
        }
    }
}

// =============================================================================
// IntentParser
// =============================================================================

/// Rule-based utterance parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntentParser;

impl IntentParser {
    pub fn new() -> Self {
        Self
    }

    // -----------------------------------------------------------------
    // Capability matching
    // -----------------------------------------------------------------

    /// Whether `text` asks for `capability`.
    ///
    /// `remembered_model` attributes a service-centre request that names no
    /// make to the make of the user's car.
    pub fn matches(
        &self,
        capability: Capability,
        text: &str,
        remembered_model: Option<&str>,
    ) -> bool {
        match capability {
            Capability::Manual => self.is_manual_question(text),
            Capability::Charger => self.is_charger_request(text),
            Capability::HyundaiService => {
                self.is_service_request(text)
                    && self.service_make(text, remembered_model) == Some(Make::Hyundai)
            }
            Capability::KiaService => {
                self.is_service_request(text)
                    && self.service_make(text, remembered_model) == Some(Make::Kia)
            }
        }
    }

    /// A question or complaint about the car that is not a request to find
    /// a place.
    pub fn is_manual_question(&self, text: &str) -> bool {
        let pats = &*INTENT_PATTERNS;
        let asks = any_match(&pats.trouble, text) || any_match(&pats.question, text);
        asks && any_match(&pats.vehicle, text) && !self.is_place_request(text)
    }

    pub fn is_charger_request(&self, text: &str) -> bool {
        any_match(&INTENT_PATTERNS.charger, text)
    }

    pub fn is_service_request(&self, text: &str) -> bool {
        any_match(&INTENT_PATTERNS.service, text)
    }

    /// Names a kind of place and asks for it to be located.
    pub fn is_place_request(&self, text: &str) -> bool {
        (self.is_charger_request(text) || self.is_service_request(text))
            && any_match(&INTENT_PATTERNS.locate, text)
    }

    /// The make named in `text`, directly or through a model name.
    pub fn mentioned_make(&self, text: &str) -> Option<Make> {
        let pats = &*INTENT_PATTERNS;
        if pats.hyundai.is_match(text) {
            return Some(Make::Hyundai);
        }
        if pats.kia.is_match(text) {
            return Some(Make::Kia);
        }
        self.extract_model(text).and_then(|m| self.make_of(m))
    }

    /// The make of a model string such as "Kia EV6".
    pub fn make_of(&self, model: &str) -> Option<Make> {
        let pats = &*INTENT_PATTERNS;
        if pats.hyundai.is_match(model) {
            Some(Make::Hyundai)
        } else if pats.kia.is_match(model) {
            Some(Make::Kia)
        } else {
            self.extract_model(model)
                .filter(|canonical| *canonical != model)
                .and_then(|canonical| self.make_of(canonical))
        }
    }

    fn service_make(&self, text: &str, remembered_model: Option<&str>) -> Option<Make> {
        self.mentioned_make(text)
            .or_else(|| remembered_model.and_then(|m| self.make_of(m)))
    }

    // -----------------------------------------------------------------
    // Argument extraction
    // -----------------------------------------------------------------

    /// Canonical name of the first supported model mentioned in `text`.
    pub fn extract_model(&self, text: &str) -> Option<&'static str> {
        MODEL_PATTERNS
            .iter()
            .find(|p| p.re.is_match(text))
            .map(|p| p.canonical)
    }

    /// The address an utterance asks to search near, if it names one.
    ///
    /// Explicit statements ("my address is ...", "I'm at ...") win over
    /// prepositions. Vague locations such as "me" or "here" and times such
    /// as "in the morning" are skipped, and end the address when they
    /// follow it.
    pub fn extract_address(&self, text: &str) -> Option<String> {
        if let Some(m) = SELF_LOCATION_RE.find(text) {
            let candidate = clean_fragment(&text[m.end()..]);
            if !is_vague(&candidate) && !is_time_phrase(&candidate) {
                return Some(candidate);
            }
        }

        let keywords: Vec<_> = ADDRESS_KEYWORD_RE.find_iter(text).collect();
        let segment = |i: usize| {
            let end = keywords.get(i + 1).map_or(text.len(), |next| next.start());
            clean_fragment(&text[keywords[i].end()..end])
        };
        let names_place = |seg: &str| !is_vague(seg) && !is_time_phrase(seg);

        let first = (0..keywords.len()).find(|&i| names_place(&segment(i)))?;
        let end = (first + 1..keywords.len())
            .find(|&i| !names_place(&segment(i)))
            .map_or(text.len(), |i| keywords[i].start());
        let candidate = clean_fragment(&text[keywords[first].end()..end]);
        (!candidate.is_empty()).then_some(candidate)
    }

    /// Read a reply to "What address should I search near?".
    ///
    /// Questions, times and replies that start like a sentence rather than
    /// a place are not addresses.
    pub fn address_answer(&self, text: &str) -> Option<String> {
        if any_match(&INTENT_PATTERNS.question, text) {
            return None;
        }
        if let Some(address) = self.extract_address(text) {
            return Some(address);
        }
        let candidate = clean_fragment(text);
        let place = strip_location_lead(&candidate);
        let rejected = is_vague(place)
            || is_time_phrase(place)
            || NOT_A_PLACE_RE.is_match(&candidate)
            || candidate.split_whitespace().count() > 12;
        (!rejected).then_some(candidate)
    }

    /// Whether a reply names a location too vague to search near.
    pub fn is_vague_location(&self, text: &str) -> bool {
        let candidate = clean_fragment(text);
        !candidate.is_empty() && is_vague(strip_location_lead(&candidate))
    }

    /// Read a reply to "What is the make and model of your car?".
    ///
    /// Supported models come back in canonical form. Other models are
    /// accepted only with their make ("Kia Sorento"); anything else is not
    /// a model.
    pub fn model_answer(&self, text: &str) -> Option<String> {
        if let Some(model) = self.extract_model(text) {
            return Some(model.to_string());
        }
        if any_match(&INTENT_PATTERNS.question, text) {
            return None;
        }
        let candidate = strip_model_lead(&clean_fragment(text));
        MAKE_MODEL_RE.is_match(&candidate).then_some(candidate)
    }
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|re| re.is_match(text))
}

/// Trim whitespace, trailing punctuation and trailing courtesy words.
fn clean_fragment(fragment: &str) -> String {
    let trim = |s: &str| -> String {
        s.trim()
            .trim_end_matches(|c: char| matches!(c, '?' | '.' | '!' | ',' | ';' | ':') || c.is_whitespace())
            .to_string()
    };

    let mut out = trim(fragment);
    for suffix in [" please", " thanks", " thank you"] {
        if strip_suffix_ignore_case(&mut out, suffix) {
            out = trim(&out);
        }
    }
    out
}

fn strip_suffix_ignore_case(s: &mut String, suffix: &str) -> bool {
    if s.len() < suffix.len() {
        return false;
    }
    let cut = s.len() - suffix.len();
    if s.is_char_boundary(cut) && s[cut..].eq_ignore_ascii_case(suffix) {
        s.truncate(cut);
        true
    } else {
        false
    }
}

fn strip_model_lead(answer: &str) -> String {
    const LEADS: &[&str] = &[
        "my car is an ",
        "my car is a ",
        "it's an ",
        "it's a ",
        "it is an ",
        "it is a ",
        "i drive an ",
        "i drive a ",
        "i have an ",
        "i have a ",
    ];
    for lead in LEADS {
        if answer.len() > lead.len()
            && answer.is_char_boundary(lead.len())
            && answer[..lead.len()].eq_ignore_ascii_case(lead)
        {
            return answer[lead.len()..].trim().to_string();
        }
    }
    answer.to_string()
}

/// Drop a leading "near", "in", "at" and the like.
fn strip_location_lead(fragment: &str) -> &str {
    match ADDRESS_KEYWORD_RE.find(fragment) {
        Some(m) if m.start() == 0 => &fragment[m.end()..],
        _ => fragment,
    }
}

fn is_time_phrase(fragment: &str) -> bool {
    TIME_PHRASE_RE.is_match(fragment.trim())
}

fn is_vague(fragment: &str) -> bool {
    let lower = fragment.trim().to_lowercase();
    lower.is_empty()
        || VAGUE_LOCATIONS.contains(&lower.as_str())
        || lower.starts_with("me ")
        || lower.starts_with("here ")
}

// =============================================================================
// Tests
// =============================================================================
