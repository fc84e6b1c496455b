use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 申报业务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    /// 年度申报
    AnnualReturn,
    /// 实益拥有人申报
    BeneficialOwnership,
}

impl ServiceType {
    pub const ALL: [ServiceType; 2] = [ServiceType::AnnualReturn, ServiceType::BeneficialOwnership];

    /// 命令行和结果里使用的名称
    pub fn name(self) -> &'static str {
        match self {
            ServiceType::AnnualReturn => "annual_return",
            ServiceType::BeneficialOwnership => "beneficial_ownership",
        }
    }

    /// 回执编号前缀
    pub fn prefix(self) -> &'static str {
        match self {
            ServiceType::AnnualReturn => "AR",
            ServiceType::BeneficialOwnership => "BO",
        }
    }

    /// 门户上对应的页面路径
    pub fn path(self) -> &'static str {
        match self {
            ServiceType::AnnualReturn => "/delay/2",
            ServiceType::BeneficialOwnership => "/delay/3",
        }
    }

    /// 从名称解析业务类型（精确匹配）
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "annual_return" => Some(ServiceType::AnnualReturn),
            "beneficial_ownership" => Some(ServiceType::BeneficialOwnership),
            _ => None,
        }
    }

    /// 生成回执编号：前缀 + UTC yyyyMMddHHmmss
    pub fn reference_number(self, at: DateTime<Utc>) -> String {
        format!("{}{}", self.prefix(), at.format("%Y%m%d%H%M%S"))
    }
}

/// 客户资料
///
/// 调用方传入的任意 JSON 对象，只读取公司名和注册号，其余字段原样保留。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientData(pub Map<String, Value>);

impl ClientData {
    /// 从 JSON 文本解析，必须是对象
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn company_name(&self) -> &str {
        self.0
            .get("company_name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
    }

    pub fn reg_number(&self) -> Option<&str> {
        self.0.get("reg_number").and_then(Value::as_str)
    }
}

/// 申报结果中互斥的部分：成功带回执编号，失败带错误描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FilingOutcome {
    Success { reference_number: String },
    Failed { error: String },
}

/// 单次申报的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingResult {
    #[serde(flatten)]
    pub outcome: FilingOutcome,
    pub service_type: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FilingResult {
    pub fn success(
        service: ServiceType,
        client: &ClientData,
        reference_number: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            outcome: FilingOutcome::Success { reference_number },
            service_type: service.name().to_string(),
            company: client.company_name().to_string(),
            reg_number: client.reg_number().map(str::to_string),
            timestamp,
        }
    }

    /// `service_type` 原样回显调用方的输入，未知类型也一样
    pub fn failed(service_type: &str, client: &ClientData, error: impl Into<String>) -> Self {
        Self {
            outcome: FilingOutcome::Failed {
                error: error.into(),
            },
            service_type: service_type.to_string(),
            company: client.company_name().to_string(),
            reg_number: client.reg_number().map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FilingOutcome::Success { .. })
    }

    pub fn reference_number(&self) -> Option<&str> {
        match &self.outcome {
            FilingOutcome::Success { reference_number } => Some(reference_number),
            FilingOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            FilingOutcome::Success { .. } => None,
            FilingOutcome::Failed { error } => Some(error),
        }
    }
}
