//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (非空 / 端口范围) 由 `validator` derive 完成
//! - output_root_template 恰好包含一个 `{}`
//! - listing_command_template 中 `{}` 是独立参数且只出现一次
//! - work / log 队列名不同
//! - source_tag 不含逗号 (审计消息以逗号分隔)
//! - 设置 broker.password 时必须同时设置 broker.username

use std::borrow::Cow;

use contracts::{
    ContractError, DispatchBlueprint, ListingKind, TEMPLATE_PLACEHOLDER,
};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 DispatchBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_output_root(blueprint)?;
    validate_listing_command(blueprint)?;
    validate_queues(blueprint)?;
    validate_source_tag(blueprint)?;
    validate_credentials(blueprint)?;
    Ok(())
}

/// derive 规则
fn validate_fields(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    match blueprint.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error(&errors, String::new())
                .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// 按字段名排序后取第一个错误，保证输出稳定
fn first_error(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut keys: Vec<&Cow<'static, str>> = errors.errors().keys().collect();
    keys.sort();

    for key in keys {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };

        match &errors.errors()[key] {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string());
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_error(inner, path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_error(inner, format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }

    None
}

/// 校验输出根目录模板
fn validate_output_root(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    let template = &blueprint.storage.output_root_template;
    let count = template.matches(TEMPLATE_PLACEHOLDER).count();
    if count != 1 {
        return Err(ContractError::config_validation(
            "storage.output_root_template",
            format!("template must contain exactly one '{{}}', found {count}"),
        ));
    }
    Ok(())
}

/// 校验列举命令模板 (仅 command 后端)
fn validate_listing_command(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    if blueprint.storage.listing != ListingKind::Command {
        return Ok(());
    }

    let template = &blueprint.storage.listing_command_template;
    let standalone = template
        .split_whitespace()
        .filter(|arg| *arg == TEMPLATE_PLACEHOLDER)
        .count();
    let total = template.matches(TEMPLATE_PLACEHOLDER).count();

    if standalone != 1 || total != 1 {
        return Err(ContractError::config_validation(
            "storage.listing_command_template",
            "template must contain '{}' exactly once as a standalone argument",
        ));
    }
    Ok(())
}

/// 校验队列配置
fn validate_queues(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    let queues = &blueprint.queues;
    if queues.work == queues.log {
        return Err(ContractError::config_validation(
            "queues",
            format!("work and log queues must differ, both are '{}'", queues.work),
        ));
    }
    Ok(())
}

/// 校验审计来源标签
fn validate_source_tag(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    if blueprint.dispatch.source_tag.contains(',') {
        return Err(ContractError::config_validation(
            "dispatch.source_tag",
            "source_tag cannot contain ','",
        ));
    }
    Ok(())
}

/// 校验 broker 凭据
fn validate_credentials(blueprint: &DispatchBlueprint) -> Result<(), ContractError> {
    let broker = &blueprint.broker;
    if broker.password.is_some() && broker.username.is_none() {
        return Err(ContractError::config_validation(
            "broker.password",
            "password requires broker.username",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let bp = DispatchBlueprint::default();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_host() {
        let mut bp = DispatchBlueprint::default();
        bp.broker.host = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("broker.host"), "got: {err}");
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_zero_port() {
        let mut bp = DispatchBlueprint::default();
        bp.broker.port = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("port must be > 0"), "got: {err}");
    }

    #[test]
    fn test_output_root_without_placeholder() {
        let mut bp = DispatchBlueprint::default();
        bp.storage.output_root_template = "/output/fixed".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("exactly one"), "got: {err}");
    }

    #[test]
    fn test_listing_placeholder_must_be_standalone() {
        let mut bp = DispatchBlueprint::default();
        bp.storage.listing_command_template = "ls --dir={}".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("standalone"), "got: {err}");
    }

    #[test]
    fn test_listing_command_ignored_for_local() {
        let mut bp = DispatchBlueprint::default();
        bp.storage.listing = ListingKind::Local;
        bp.storage.listing_command_template = "unused".into();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_same_queue_names() {
        let mut bp = DispatchBlueprint::default();
        bp.queues.log = bp.queues.work.clone();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("must differ"), "got: {err}");
    }

    #[test]
    fn test_source_tag_with_comma() {
        let mut bp = DispatchBlueprint::default();
        bp.dispatch.source_tag = "a,b".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("source_tag"), "got: {err}");
    }

    #[test]
    fn test_password_without_username() {
        let mut bp = DispatchBlueprint::default();
        bp.broker.password = Some("secret".into());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("broker.password"), "got: {err}");

        bp.broker.username = Some("dispatch".into());
        assert!(validate(&bp).is_ok());
    }
}
