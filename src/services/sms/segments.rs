//! Разбиение текста на сегменты SMS.
//!
//! GSM 03.38 (7 бит): 160 септетов в одиночном SMS, 153 в части составного.
//! Символы таблицы расширения занимают два септета и не разрываются.
//! Всё остальное уходит в UCS-2: 70 / 67 единиц UTF-16, суррогатные пары
//! не разрываются.

const GSM7_SINGLE: usize = 160;
const GSM7_PART: usize = 153;
const UCS2_SINGLE: usize = 70;
const UCS2_PART: usize = 67;

const GSM7_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?\
¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";
const GSM7_EXTENSION: &str = "\u{c}^{}\\[~]|€";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsEncoding {
    Gsm7,
    Ucs2,
}

impl SmsEncoding {
    pub fn detect(text: &str) -> Self {
        if text.chars().all(|c| gsm7_cost(c).is_some()) {
            SmsEncoding::Gsm7
        } else {
            SmsEncoding::Ucs2
        }
    }

    fn limits(&self) -> (usize, usize) {
        match self {
            SmsEncoding::Gsm7 => (GSM7_SINGLE, GSM7_PART),
            SmsEncoding::Ucs2 => (UCS2_SINGLE, UCS2_PART),
        }
    }

    fn cost(&self, c: char) -> usize {
        match self {
            SmsEncoding::Gsm7 => gsm7_cost(c).unwrap_or(1),
            SmsEncoding::Ucs2 => c.len_utf16(),
        }
    }
}

fn gsm7_cost(c: char) -> Option<usize> {
    if GSM7_BASIC.contains(c) {
        Some(1)
    } else if GSM7_EXTENSION.contains(c) {
        Some(2)
    } else {
        None
    }
}

/// Разбить сообщение на части для отправки. Пустой текст - пустой список.
pub fn divide_message(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let encoding = SmsEncoding::detect(text);
    let (single, part) = encoding.limits();

    let total: usize = text.chars().map(|c| encoding.cost(c)).sum();
    if total <= single {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for c in text.chars() {
        let cost = encoding.cost(c);
        if used + cost > part {
            parts.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += cost;
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
