//! 전략 레지스트리
//!
//! 전략 ID와 구현체를 명시적으로 연결합니다. 등록은 코드로만 이루어집니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::strategies::{MacdZeroAxisStrategy, PreCrossStrategy, TripleCrossStrategy};
use crate::traits::{Strategy, StrategyMetadata};

/// 전략 레지스트리.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<&'static str, Arc<dyn Strategy>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StrategyRegistry {
    /// 빈 레지스트리.
    pub fn new() -> Self {
        Self::default()
    }

    /// 내장 전략이 모두 등록된 레지스트리.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PreCrossStrategy::new());
        registry.register(TripleCrossStrategy::new());
        registry.register(MacdZeroAxisStrategy::new());
        registry
    }

    /// 전략을 등록합니다. 같은 ID가 있으면 교체하고 `true`를 반환합니다.
    pub fn register(&mut self, strategy: impl Strategy + 'static) -> bool {
        self.strategies
            .insert(strategy.id(), Arc::new(strategy))
            .is_some()
    }

    /// ID로 전략 검색
    pub fn get(&self, id: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(id).cloned()
    }

    /// ID로 전략 검색. 없으면 `ConfigError::UnknownStrategy`.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Strategy>, ConfigError> {
        self.get(id)
            .ok_or_else(|| ConfigError::UnknownStrategy(id.to_string()))
    }

    /// 등록된 전략 메타데이터 (ID 순)
    pub fn metadata(&self) -> Vec<StrategyMetadata> {
        self.strategies.values().map(|s| s.metadata()).collect()
    }

    /// 등록된 전략 수
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// 비어 있는지 확인
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_core::SignalKind;

    #[test]
    fn test_builtin_registry() {
        let registry = StrategyRegistry::with_builtin();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.metadata().iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["macd_zero_axis", "pre_cross", "triple_cross"]
        );

        let zero_axis = registry.get("macd_zero_axis").unwrap();
        assert_eq!(zero_axis.entry_kinds(), &[SignalKind::Mid, SignalKind::Post]);
    }

    #[test]
    fn test_unknown_strategy() {
        let registry = StrategyRegistry::with_builtin();
        assert!(registry.get("fibonacci").is_none());
        assert_eq!(
            registry.resolve("fibonacci").err(),
            Some(ConfigError::UnknownStrategy("fibonacci".to_string()))
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = StrategyRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.register(PreCrossStrategy::new()));
        assert!(registry.register(PreCrossStrategy::new()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_metadata_listing() {
        let metadata = StrategyRegistry::with_builtin().metadata();
        let pre = metadata.iter().find(|m| m.id == "pre_cross").unwrap();
        assert_eq!(pre.required_minimum_bars, 40);
        assert_eq!(pre.entry_kinds, vec![SignalKind::Pre]);
    }
}
