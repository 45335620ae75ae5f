use crate::survey::repo_types::NewSurveyResponse;

/// Build a submission from raw form pairs. `interests` may repeat; every
/// other field keeps its last value and defaults to empty text.
pub fn survey_form(pairs: Vec<(String, String)>) -> NewSurveyResponse {
    let mut out = NewSurveyResponse::default();
    for (key, value) in pairs {
        match key.as_str() {
            "name" => out.name = value,
            "age" => out.age = value,
            "gender" => out.gender = value,
            "interests" => out.interests.push(value),
            "comments" => out.comments = value,
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn collects_repeated_interests_in_order() {
        let form = survey_form(pairs(&[
            ("name", "Alice"),
            ("interests", "sports"),
            ("gender", "ж"),
            ("interests", "music"),
        ]));
        assert_eq!(form.name, "Alice");
        assert_eq!(form.gender, "ж");
        assert_eq!(form.interests, vec!["sports", "music"]);
    }

    #[test]
    fn missing_fields_are_empty() {
        let form = survey_form(Vec::new());
        assert_eq!(form, NewSurveyResponse::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let form = survey_form(pairs(&[("csrf", "x"), ("age", "abc")]));
        assert_eq!(form.age, "abc");
    }
}
