//! crates/novel_assistant_core/src/prompt.rs
//!
//! Prompt templates and the serialization of a `GenerationContext` into the
//! single text prompt sent to the generation service.

use crate::domain::{ChapterSummary, GenerationContext, OutlineTarget};

/// Writing and markup guidelines placed right before the author's instruction.
pub const WRITING_GUIDELINES: &str = r#"你是一个专业的小说创作助手。请基于以下信息创作故事情节：
1. 写作要求：
   - 保持情节连贯性和人物性格一致性
   - 细腻的描写和自然的对话
   - 符合小说整体风格和主题
2. 标记要求：
   - 新角色首次出场用【角色名：性格特征、外貌特征、身份背景】
   - 已有角色出场用【角色名】
   - 重要情节转折用《情节》标记"#;

const EXTRACTION_TEMPLATE: &str = r#"请分析以下故事中用【】标记的角色信息，并将其转换为严格的JSON格式。
要求：
1. 必须返回一个JSON数组
2. 每个角色必须包含以下字段：
   - name (字符串): 角色名称
   - description (字符串): 性格和外貌特征
   - characteristics (字符串): 身份背景
   - role_type (字符串): 必须是 "主角"、"配角" 或 "反派" 之一
返回格式必须严格遵循以下示例：
[
    {
        "name": "李明",
        "description": "性格开朗、正直，身材高大",
        "characteristics": "刚毕业的大学生",
        "role_type": "主角"
    }
]
注意：
1. 返回的必须是可以直接解析的JSON格式
2. 不要添加任何额外的说明文字
3. 确保所有引号和逗号使用正确

故事内容：
{content}

仅返回JSON数组："#;

/// Joins the context sections and the instruction into one prompt.
///
/// Sections appear in a fixed order (novel outline, current position, earlier
/// summaries sorted by chapter, character roster) and are left out entirely
/// when they carry no data.
pub fn build_generation_prompt(instruction: &str, context: &GenerationContext) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(outline) = context.novel_outline.as_deref().filter(|o| !o.trim().is_empty()) {
        sections.push(format!("小说大纲：\n{}", outline));
    }

    if let Some(chapter) = &context.current_chapter {
        let outline = if chapter.outline.trim().is_empty() {
            "暂无大纲"
        } else {
            chapter.outline.as_str()
        };
        sections.push(format!(
            "当前位置：第{}章 {}\n章节大纲：\n{}",
            chapter.chapter_number, chapter.title, outline
        ));
    }

    if !context.previous_summaries.is_empty() {
        let mut summaries: Vec<&ChapterSummary> = context.previous_summaries.iter().collect();
        summaries.sort_by_key(|s| s.chapter_number);
        let mut block = String::from("之前章节摘要：");
        for s in summaries {
            block.push_str(&format!("\n第{}章：{}", s.chapter_number, s.summary));
        }
        sections.push(block);
    }

    if !context.characters.is_empty() {
        let mut block = String::from("已有角色：");
        for c in &context.characters {
            block.push_str(&format!("\n- {}: {}", c.name, c.description));
            if !c.characteristics.trim().is_empty() {
                block.push_str(&format!(" ({})", c.characteristics));
            }
        }
        sections.push(block);
    }

    sections.push(format!("{}\n\n{}", WRITING_GUIDELINES, instruction));
    sections.join("\n\n")
}

pub fn summary_prompt(content: &str) -> String {
    format!(
        "请为以下内容生成一个简洁的摘要，突出关键情节：\n\n{}\n\n摘要：",
        content
    )
}

pub fn outline_prompt(target: &OutlineTarget) -> String {
    match target {
        OutlineTarget::Novel { title } => format!(
            "请为小说《{}》生成一个详细的整体大纲。大纲应包含：\n\
             1. 小说的整体故事架构\n\
             2. 主要人物及其发展轨迹\n\
             3. 重要的情节转折点\n\
             4. 故事的主题和中心思想",
            title
        ),
        OutlineTarget::Chapter { content } => format!(
            "请根据以下章节内容生成一个详细的章节大纲。大纲应包含：\n\
             1. 本章的主要内容和目标\n\
             2. 关键场景和对话\n\
             3. 与整体故事的关联\n\
             4. 需要重点描写的细节\n\n\
             章节内容：\n{}",
            content
        ),
    }
}

/// Asks for a whole-novel outline rebuilt from the chapter summaries.
pub fn novel_outline_prompt(summaries: &[ChapterSummary]) -> String {
    let summary_text = summaries
        .iter()
        .map(|s| format!("第{}章：{}", s.chapter_number, s.summary))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "基于以下各章节摘要，生成一个完整的小说大纲，需要：\n\
         1. 突出主要情节发展\n\
         2. 体现人物关系变化\n\
         3. 注意情节的连贯性\n\n\
         章节摘要：\n{}\n\n请生成大纲：",
        summary_text
    )
}

pub fn key_points_prompt(content: &str) -> String {
    format!(
        "请从以下内容中提取3-5个关键情节点，每个情节点用一句话描述：\n\n{}\n\n关键情节：",
        content
    )
}

pub fn extraction_prompt(content: &str) -> String {
    EXTRACTION_TEMPLATE.replace("{content}", content)
}
