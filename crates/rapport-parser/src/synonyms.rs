//! Fixed synonym and keyword tables for the fallback ladder
//!
//! Every list here is consulted in declared order and the first match wins,
//! so identical input always yields identical output. Reordering a list is an
//! observable behavior change.

/// Localized synonyms for `replySuggestion`
pub const REPLY_SYNONYMS: [&str; 6] = [
    "回复建议",
    "建议回复",
    "话术建议",
    "具体的回复建议",
    "建议的回复内容",
    "回复内容",
];

/// Localized synonyms for `strategyAnalysis`
pub const STRATEGY_SYNONYMS: [&str; 6] = [
    "策略分析",
    "心理分析",
    "军师分析",
    "对方当前的情绪和潜在意图",
    "关键洞察",
    "策略建议",
];

/// Localized synonyms for `riskLevel`
pub const RISK_LEVEL_SYNONYMS: [&str; 3] = ["风险等级", "风险级别", "风险"];

/// Localized synonyms for `isSafe`
pub const IS_SAFE_SYNONYMS: [&str; 3] = ["是否安全", "安全", "安全性"];

/// Localized synonyms for `triggeredRisks`
pub const TRIGGERED_RISKS_SYNONYMS: [&str; 4] = ["触发的风险", "风险列表", "雷区列表", "触发雷区"];

/// Localized synonyms for `suggestion`
pub const SUGGESTION_SYNONYMS: [&str; 4] = ["建议", "修改建议", "修正建议", "优化建议"];

/// Localized synonyms for `facts`
pub const FACTS_SYNONYMS: [&str; 5] = ["事实", "事实信息", "基本信息", "个人资料", "用户信息"];

/// Localized synonyms for `redTags`
pub const RED_TAGS_SYNONYMS: [&str; 6] =
    ["红色标签", "雷区", "风险标签", "红标签", "不要做的事", "敏感话题"];

/// Localized synonyms for `greenTags`
pub const GREEN_TAGS_SYNONYMS: [&str; 6] =
    ["绿色标签", "策略", "策略标签", "绿标签", "推荐做法", "沟通技巧"];

/// Ecosystem-variant names for `replySuggestion`
pub const REPLY_VARIANTS: [&str; 5] =
    ["reply", "response", "answer", "recommended_response", "suggestion"];

/// Ecosystem-variant names for `strategyAnalysis`
pub const STRATEGY_VARIANTS: [&str; 5] =
    ["strategy", "analysis", "insights", "summary", "assessment"];

/// Ecosystem-variant names for `isSafe`
pub const IS_SAFE_VARIANTS: [&str; 4] = ["safe", "security", "check_result", "result"];

/// Ecosystem-variant names for `triggeredRisks`
pub const TRIGGERED_RISKS_VARIANTS: [&str; 5] =
    ["risks", "warnings", "alerts", "issues", "problems"];

/// Ecosystem-variant names for `suggestion`
pub const SUGGESTION_VARIANTS: [&str; 5] =
    ["recommendation", "advice", "tip", "guidance", "instruction"];

/// Ecosystem-variant names for `facts`
pub const FACTS_VARIANTS: [&str; 5] =
    ["information", "data", "profile", "user_profile", "personal_info"];

/// Ecosystem-variant names for `redTags`
pub const RED_TAGS_VARIANTS: [&str; 6] =
    ["risks", "warnings", "alerts", "donts", "avoid", "red_flags"];

/// Ecosystem-variant names for `greenTags`
pub const GREEN_TAGS_VARIANTS: [&str; 6] =
    ["recommendations", "suggestions", "tips", "dos", "best_practices", "green_flags"];

/// Wrapper keys inspected during one-level nested extraction
pub const WRAPPER_KEYS: [&str; 4] = ["analysis", "data", "check", "result"];

/// Array-valued keys that may carry a reply suggestion
pub const REPLY_ARRAY_KEYS: [&str; 4] =
    ["suggestions", "replySuggestions", "response_suggestions", "recommendations"];

/// Array-valued keys that may carry strategy analysis
pub const STRATEGY_ARRAY_KEYS: [&str; 4] = ["points", "insights", "analysis_points", "key_points"];

/// Array-valued keys that may carry triggered risks
pub const RISK_ARRAY_KEYS: [&str; 6] =
    ["risks", "warnings", "alerts", "issues", "problems", "risk_list"];

/// Array-valued keys whose elements split into red/green tags
pub const TAG_ARRAY_KEYS: [&str; 4] = ["tags", "labels", "categories", "items"];

/// High-severity keywords: any occurrence forces `Danger`
pub const HIGH_RISK_KEYWORDS: [&str; 7] =
    ["高风险", "危险", "严重", "紧急", "立即", "禁止", "绝对不能"];

/// Medium-severity keywords: force `Warning` when no high-severity hit
pub const MEDIUM_RISK_KEYWORDS: [&str; 6] = ["风险", "注意", "谨慎", "小心", "避免", "不宜"];

/// Keywords marking a line as fact-bearing during free-text inference
pub const FACT_LINE_KEYWORDS: [&str; 10] = [
    "生日",
    "爱好",
    "职业",
    "年龄",
    "性别",
    "地区",
    "birthday",
    "hobby",
    "profession",
    "age",
];

/// Keywords marking a line as a red tag during free-text inference
pub const RED_TAG_LINE_KEYWORDS: [&str; 7] =
    ["不要", "避免", "禁止", "don't", "avoid", "never", "prohibited"];

/// Keywords marking a line as a green tag during free-text inference
pub const GREEN_TAG_LINE_KEYWORDS: [&str; 7] =
    ["推荐", "建议", "可以", "recommend", "suggest", "should", "good"];

/// Domain keywords scanned when synthesizing a reply suggestion, with the
/// canned phrase each one selects
pub const CANNED_REPLIES: [(&str, &str); 8] = [
    ("问题", "这是一个很好的问题，我需要更多信息来给出准确的回答。"),
    ("询问", "这是一个很好的问题，我需要更多信息来给出准确的回答。"),
    ("感谢", "不客气，很高兴能帮到你。"),
    ("谢谢", "不客气，很高兴能帮到你。"),
    ("建议", "感谢你的建议，我会认真考虑。"),
    ("意见", "感谢你的建议，我会认真考虑。"),
    ("抱歉", "没关系，我理解你的情况。"),
    ("对不起", "没关系，我理解你的情况。"),
];

/// Fallback reply when no canned-reply keyword matches
pub const DEFAULT_REPLY: &str = "我理解你的意思，让我们继续这个话题。";

/// Domain keywords scanned when synthesizing a strategy analysis
pub const CANNED_STRATEGIES: [(&str, &str); 8] = [
    ("工作", "对方可能正在讨论工作相关话题，建议保持专业态度，提供有价值的见解。"),
    ("项目", "对方可能正在讨论工作相关话题，建议保持专业态度，提供有价值的见解。"),
    ("情感", "对方正在表达情感，建议给予理解和支持，避免过度分析。"),
    ("感受", "对方正在表达情感，建议给予理解和支持，避免过度分析。"),
    ("问题", "对方可能遇到困难，建议提供帮助和支持，避免直接给出解决方案。"),
    ("困难", "对方可能遇到困难，建议提供帮助和支持，避免直接给出解决方案。"),
    ("计划", "对方在讨论计划，建议关注细节和时间安排，提供实用建议。"),
    ("安排", "对方在讨论计划，建议关注细节和时间安排，提供实用建议。"),
];

/// Fallback strategy analysis when no keyword matches
pub const DEFAULT_STRATEGY: &str = "对方正在进行一般性交流，建议保持友好态度，适当表达自己的观点。";

/// Domain keywords that synthesize a red tag
pub const CANNED_RED_TAGS: [(&str, &str); 8] = [
    ("敏感", "避免谈论隐私话题"),
    ("隐私", "避免谈论隐私话题"),
    ("政治", "避免政治宗教话题"),
    ("宗教", "避免政治宗教话题"),
    ("前任", "避免谈论前任"),
    ("ex", "避免谈论前任"),
    ("收入", "避免直接询问收入"),
    ("money", "避免直接询问收入"),
];

/// Domain keywords that synthesize a green tag
pub const CANNED_GREEN_TAGS: [(&str, &str); 8] = [
    ("爱好", "分享兴趣爱好"),
    ("兴趣", "分享兴趣爱好"),
    ("工作", "讨论工作话题"),
    ("career", "讨论工作话题"),
    ("旅行", "分享旅行经历"),
    ("travel", "分享旅行经历"),
    ("美食", "讨论美食话题"),
    ("food", "讨论美食话题"),
];

/// Canned suggestion used when a safety check finds nothing
pub const SAFE_SUGGESTION: &str = "安全检查完成，未发现明显风险";

/// Canned suggestion used when a safety check found risk indicators
pub const UNSAFE_SUGGESTION: &str = "检测到潜在风险，建议修改后再发送。";
