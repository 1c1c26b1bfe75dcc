//! Built-in patch targets.
//!
//! Each target is one UI block whose icon resolution we want to trace. Every
//! target carries two rules: an anchor insertion that logs the raw icon inputs
//! once per parse, and a block replacement that rewrites the per-item
//! `titleList.map` so each resolved icon is logged. All injected code is gated
//! on [`DEBUG_FLAG`] at the app's runtime; this crate never reads the flag.

use crate::rule::{PatchRule, RuleAction, RuleError};
use std::path::PathBuf;

/// Env flag the injected code checks.
pub const DEBUG_FLAG: &str = "NEXT_PUBLIC_DEBUG_ICON_SELECTION";

/// Ids of the built-in targets, in run order.
pub const BUILTIN_IDS: [&str; 3] = ["icon-grid", "objection-accordion", "outcome-icons"];

/// What a routine does when its file is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFilePolicy {
    /// Report the file as missing; not an error
    Report,
    /// Surface the I/O error to the caller
    Propagate,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub id: String,
    /// Component name used in status lines and log labels
    pub component: String,
    /// Path relative to the project root (or absolute)
    pub file: PathBuf,
    pub missing_file: MissingFilePolicy,
    /// Applied in order; each sees the previous rule's output
    pub rules: Vec<PatchRule>,
}

/// All built-in targets, in run order.
pub fn builtin_targets() -> Result<Vec<Target>, RuleError> {
    Ok(vec![icon_grid()?, objection_accordion()?, outcome_icons()?])
}

pub fn icon_grid() -> Result<Target, RuleError> {
    let anchor = PatchRule::new(
        "log-saved-icons",
        r"(const icons = \[[^\]]*\];\r?\n)(\s*return titleList\.map)",
        RuleAction::InsertBetween {
            text: ICON_GRID_ANCHOR_LOG.to_string(),
        },
        "[IconGrid] Saved icon fields:",
    )?;

    let block = PatchRule::new(
        "log-feature-icons",
        r"return titleList\.map\(\(title, index\) => \(\{[\s\S]*?icon: icons\[index\] \|\| getDefaultIcon\(title\)[^\n]*\n[ \t]*\}\)\);",
        RuleAction::Replace {
            text: ICON_GRID_MAP_BLOCK.to_string(),
        },
        "[IconGrid] Feature ",
    )?;

    Ok(Target {
        id: "icon-grid".to_string(),
        component: "IconGrid".to_string(),
        file: PathBuf::from("src/modules/UIBlocks/Features/IconGrid.tsx"),
        missing_file: MissingFilePolicy::Propagate,
        rules: vec![anchor, block],
    })
}

pub fn objection_accordion() -> Result<Target, RuleError> {
    let anchor = PatchRule::new(
        "log-icon-list",
        r"(const iconList = icons \? parsePipeData\(icons\) : \[\];\r?\n)(\s*return titleList\.map)",
        RuleAction::InsertBetween {
            text: OBJECTION_ANCHOR_LOG.to_string(),
        },
        "[ObjectionAccordion] Icon list:",
    )?;

    let block = PatchRule::new(
        "log-objection-icons",
        r"return titleList\.map\(\(title, index\) => \(\{[\s\S]*?icon: iconList\[index\] \|\| getDefaultIcon\(title\)[^\n]*\n[ \t]*\}\)\);",
        RuleAction::Replace {
            text: OBJECTION_MAP_BLOCK.to_string(),
        },
        "[ObjectionAccordion] Objection ",
    )?;

    Ok(Target {
        id: "objection-accordion".to_string(),
        component: "ObjectionAccordion".to_string(),
        file: PathBuf::from("src/modules/UIBlocks/Objection/ObjectionAccordion.tsx"),
        missing_file: MissingFilePolicy::Propagate,
        rules: vec![anchor, block],
    })
}

pub fn outcome_icons() -> Result<Target, RuleError> {
    let anchor = PatchRule::new(
        "log-outcome-inputs",
        r"(const descriptionList = descriptions\.split\('\|'\)\.map\(d => d\.trim\(\)\)\.filter\(d => d\);\r?\n)(\s*return titleList\.map)",
        RuleAction::InsertBetween {
            text: OUTCOME_ANCHOR_LOG.to_string(),
        },
        "[OutcomeIcons] Parsing outcomes:",
    )?;

    let block = PatchRule::new(
        "log-outcome-icons",
        r"return titleList\.map\(\(title, index\) => \{[\s\S]*?const icon = getIcon\(iconCategory, \{ title, description \}\);[\s\S]*?\n[ \t]*\}\);",
        RuleAction::Replace {
            text: OUTCOME_MAP_BLOCK.to_string(),
        },
        "[OutcomeIcons] Outcome ",
    )?;

    Ok(Target {
        id: "outcome-icons".to_string(),
        component: "OutcomeIcons".to_string(),
        file: PathBuf::from("src/modules/UIBlocks/Results/OutcomeIcons.tsx"),
        missing_file: MissingFilePolicy::Report,
        rules: vec![anchor, block],
    })
}

const ICON_GRID_ANCHOR_LOG: &str = "  if (process.env.NEXT_PUBLIC_DEBUG_ICON_SELECTION === 'true') {
    console.log('🎯 [IconGrid] Saved icon fields:', icons);
  }
";

const ICON_GRID_MAP_BLOCK: &str = r#"return titleList.map((title, index) => {
    const savedIcon = icons[index];
    const icon = savedIcon || getDefaultIcon(title);
    if (process.env.NEXT_PUBLIC_DEBUG_ICON_SELECTION === 'true') {
      console.log(`🎯 [IconGrid] Feature ${index + 1} "${title}":`, { savedIcon, icon, usedFallback: !savedIcon });
    }
    return {
      id: `feature-${index}`,
      index,
      title,
      description: descriptionList[index] || 'Feature description not provided.',
      iconType: '',
      icon
    };
  });"#;

const OBJECTION_ANCHOR_LOG: &str = "  if (process.env.NEXT_PUBLIC_DEBUG_ICON_SELECTION === 'true') {
    console.log('🎯 [ObjectionAccordion] Icon list:', { raw: icons, parsed: iconList });
  }
";

const OBJECTION_MAP_BLOCK: &str = r#"return titleList.map((title, index) => {
    const providedIcon = iconList[index];
    const icon = providedIcon || getDefaultIcon(title);
    if (process.env.NEXT_PUBLIC_DEBUG_ICON_SELECTION === 'true') {
      console.log(`🎯 [ObjectionAccordion] Objection ${index + 1} "${title}":`, { providedIcon, icon, usedFallback: !providedIcon });
    }
    return {
      id: `objection-${index}`,
      index,
      title,
      response: responseList[index] || 'Response not provided.',
      icon
    };
  });"#;

const OUTCOME_ANCHOR_LOG: &str = "  if (process.env.NEXT_PUBLIC_DEBUG_ICON_SELECTION === 'true') {
    console.log('🎯 [OutcomeIcons] Parsing outcomes:', { titleList, descriptionList });
  }
";

const OUTCOME_MAP_BLOCK: &str = r#"return titleList.map((title, index) => {
    const iconCategory = blockContent[`icon_${index + 1}` as keyof OutcomeIconsContent] as string | undefined;
    const description = descriptionList[index] || 'Amazing results await';
    const resolvedIcon = getIcon(iconCategory, { title, description });
    if (process.env.NEXT_PUBLIC_DEBUG_ICON_SELECTION === 'true') {
      console.log(`🎯 [OutcomeIcons] Outcome ${index + 1} "${title}":`, { iconCategory, resolvedIcon });
    }
    return {
      id: `outcome-${index}`,
      icon: resolvedIcon,
      title,
      description
    };
  });"#;
