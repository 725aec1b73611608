use validator::ValidationErrors;

/// 将 validator 的字段错误整理为一条可读消息
///
/// 字段按名称排序，保证同样的输入得到同样的消息。
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<String> = fields
        .into_iter()
        .map(|(field, errs)| {
            let detail = errs
                .first()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("failed '{}' check", e.code),
                })
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{field}: {detail}")
        })
        .collect();

    if parts.is_empty() {
        "Invalid request".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "must be at least 3 characters"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_message_lists_fields_in_order() {
        let probe = Probe {
            name: "ab".to_string(),
            email: "nope".to_string(),
        };
        let errors = probe.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "email: failed 'email' check; name: must be at least 3 characters"
        );
    }
}
