//! OTP 提取 - 业务能力层
//!
//! 按优先级排列的正则列表，第一个命中的规则获胜。
//! 顺序有业务含义：带标签的规则必须排在通用 6 位数字之前。

use regex::Regex;

/// 单条提取规则
#[derive(Debug, Clone)]
pub struct OtpMatcher {
    pub label: &'static str,
    regex: Regex,
}

impl OtpMatcher {
    /// `pattern` 的第一个捕获组即验证码
    pub fn new(label: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label,
            regex: Regex::new(pattern)?,
        })
    }

    pub fn find(&self, text: &str) -> Option<String> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// 有序的提取规则集
#[derive(Debug, Clone)]
pub struct OtpExtractor {
    matchers: Vec<OtpMatcher>,
}

impl OtpExtractor {
    pub fn new(matchers: Vec<OtpMatcher>) -> Self {
        Self { matchers }
    }

    /// 邮件正文规则：OTP → code → verification → 任意 6 位数字
    pub fn email() -> Self {
        Self::new(vec![
            OtpMatcher::new("otp", r"(?i)OTP[:\s]*(\d{6})").expect("otp regex is valid"),
            OtpMatcher::new("code", r"(?i)code[:\s]*(\d{6})").expect("code regex is valid"),
            OtpMatcher::new("verification", r"(?i)verification[:\s]*(\d{6})")
                .expect("verification regex is valid"),
            OtpMatcher::new("any_six_digits", r"(\d{6})").expect("fallback regex is valid"),
        ])
    }

    /// 短信规则：独立的 6 位数字
    pub fn sms() -> Self {
        Self::new(vec![
            OtpMatcher::new("six_digit_word", r"\b(\d{6})\b").expect("sms regex is valid")
        ])
    }

    /// 返回验证码和命中的规则名
    pub fn extract_labeled(&self, text: &str) -> Option<(String, &'static str)> {
        self.matchers
            .iter()
            .find_map(|m| m.find(text).map(|code| (code, m.label)))
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        self.extract_labeled(text).map(|(code, _)| code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_label_beats_generic_fallback() {
        let extractor = OtpExtractor::email();
        let text = "Reference 111111 was received. Your OTP: 654321";

        assert_eq!(
            extractor.extract_labeled(text),
            Some(("654321".to_string(), "otp"))
        );
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let extractor = OtpExtractor::email();
        assert_eq!(extractor.extract("your otp 123456"), Some("123456".to_string()));
        assert_eq!(
            extractor.extract_labeled("Verification: 777777"),
            Some(("777777".to_string(), "verification"))
        );
        assert_eq!(
            extractor.extract_labeled("CODE:424242"),
            Some(("424242".to_string(), "code"))
        );
    }

    #[test]
    fn test_generic_fallback_used_when_no_label() {
        let extractor = OtpExtractor::email();
        assert_eq!(
            extractor.extract_labeled("Use 998877 to continue"),
            Some(("998877".to_string(), "any_six_digits"))
        );
    }

    #[test]
    fn test_email_fallback_takes_first_six_of_longer_number() {
        // 通用规则没有边界限制，与短信规则不同
        let extractor = OtpExtractor::email();
        assert_eq!(extractor.extract("ref 12345678"), Some("123456".to_string()));
    }

    #[test]
    fn test_no_code() {
        assert_eq!(OtpExtractor::email().extract("no code here"), None);
        assert_eq!(OtpExtractor::sms().extract("no code here"), None);
    }

    #[test]
    fn test_sms_requires_word_boundary() {
        let extractor = OtpExtractor::sms();
        assert_eq!(
            extractor.extract("Your code is 998877, thanks"),
            Some("998877".to_string())
        );
        assert_eq!(extractor.extract("account 12345678"), None);
        assert_eq!(extractor.extract("pin 12345"), None);
    }
}
