use std::path::Path;

use serde_json::json;

use crate::adapters::{kinds, ResourceKind};
use crate::cluster::backup_kind;
use crate::recorder::StepRecorder;
use crate::rules::{Action, Gate, Rule, RuleMeta};
use crate::types::errors::Result;
use crate::types::{ActionGroup, Deadline, StepStatus, Target, Version};

use super::fail;

/// Write one YAML step per kind: platform configuration singletons and every
/// InferenceService. Backups are local files, so they are written in dry-run too.
pub(super) fn backup_kinds(
    deadline: &Deadline,
    target: &Target,
    parent: &dyn StepRecorder,
    kinds: &[ResourceKind],
    dir: &Path,
) -> Result<usize> {
    let mut total = 0;
    for kind in kinds {
        let step = parent.child(&format!("backup {}", kind.kind), "");
        let files = backup_kind(deadline, target.client(), kind, dir)
            .map_err(|e| fail(step.as_ref(), e, &format!("backing up {}", kind.kind)))?;
        step.add_detail(
            "files",
            json!(files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>()),
        );
        let msg = if files.is_empty() {
            format!("no {} instances", kind.kind)
        } else {
            format!("wrote {} file(s)", files.len())
        };
        step.complete(StepStatus::Completed, &msg);
        total += files.len();
    }
    Ok(total)
}

pub struct PlatformConfigBackup {
    meta: RuleMeta<ActionGroup>,
}

impl PlatformConfigBackup {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "backup.platform-config",
                "Platform configuration backup",
                "Back up platform configuration and InferenceServices to YAML",
                ActionGroup::Backup,
            ),
        }
    }
}

impl Default for PlatformConfigBackup {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PlatformConfigBackup {
    type Group = ActionGroup;

    fn meta(&self) -> &RuleMeta<ActionGroup> {
        &self.meta
    }

    fn can_apply(&self, current: &Version, target: &Version) -> bool {
        Gate::always().allows(current, target)
    }
}

impl Action for PlatformConfigBackup {
    fn execute(&self, deadline: &Deadline, target: &Target) -> Result<()> {
        let rec = target.recorder()?;
        let dir = target.output_dir();
        let step = rec.child("backup", &format!("write YAML to {}", dir.display()));
        let kinds = [
            kinds::data_science_cluster(),
            kinds::dsc_initialization(),
            kinds::inference_service(),
        ];
        let total = backup_kinds(deadline, target, step.as_ref(), &kinds, dir)
            .map_err(|e| fail(step.as_ref(), e, "platform backup"))?;
        step.complete(StepStatus::Completed, &format!("{total} file(s) written"));
        Ok(())
    }
}
