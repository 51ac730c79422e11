use std::iter;

use anyhow::{anyhow, Result};

pub use crate::rules::CategorizationRule;

/// The label given to transactions no rule recognizes.
pub const FALLBACK_LABEL: &str = "Por clasificar";

/// Matches any description, including an empty one.
const MATCH_ANYTHING: &str = r"(?s).*";

/// The built-in imputaciones, most specific first.
///
/// Columns are pattern, label and PUC account code.
const COLOMBIAN_RULES: &[(&str, &str, &str)] = &[
    (r"N[OÓ]MINA", "Nómina", "510506"),
    (r"\bGMF\b|4\s*X\s*1000|GRAVAMEN", "Gravamen movimientos financieros", "530595"),
    (r"RETE\s*FUENTE|RETENCI[OÓ]N", "Retención en la fuente", "135515"),
    (r"\bIVA\b", "IVA", "240810"),
    (r"\bDIAN\b|IMPUESTO", "Impuestos", "240405"),
    (r"CUOTA\s+(DE\s+)?MANEJO|COMISI[OÓ]N|COBRO\s+SERVICIO", "Gastos bancarios", "530505"),
    (r"INTERES", "Rendimientos financieros", "421005"),
    (r"ARRIENDO|ARRENDAMIENTO", "Arrendamientos", "512010"),
    (
        r"\b(EPM|CODENSA|ENEL|ETB|CLARO|MOVISTAR|TIGO)\b|ACUEDUCTO|GAS\s+NATURAL|SERVICIOS\s+P[UÚ]BLICOS",
        "Servicios públicos",
        "513525",
    ),
    (r"PROVEEDOR|\bPSE\b", "Proveedores", "220505"),
    (r"TRANSF|TRASLADO", "Transferencias", "111005"),
    (r"CONSIGNACI[OÓ]N|ABONO|DEP[OÓ]SITO", "Consignaciones", "130505"),
];

/// The built-in rules, in evaluation order.
pub fn colombian_rules() -> Vec<CategorizationRule> {
    COLOMBIAN_RULES
        .iter()
        .map(|(pattern, label, account)| {
            CategorizationRule::new(pattern, *label, Some(*account))
                .expect("built-in rule patterns are valid")
        })
        .collect()
}

/// The outcome of categorizing one description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorization {
    pub label: String,
    pub account: Option<String>,
}

/// An ordered, read-only list of categorization rules ending in a rule
/// that matches everything.
///
/// Rules are tried strictly by position: the first one whose pattern
/// matches decides, so more specific patterns have to come first.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<CategorizationRule>,
    fallback: CategorizationRule,
}

impl RuleSet {
    /// Create a rule set that falls back to "Por clasificar".
    pub fn new(rules: Vec<CategorizationRule>) -> Result<Self> {
        Self::with_fallback(rules, FALLBACK_LABEL)
    }

    /// Create a rule set with a custom label for unrecognized transactions.
    pub fn with_fallback(rules: Vec<CategorizationRule>, fallback_label: &str) -> Result<Self> {
        if fallback_label.trim().is_empty() {
            return Err(anyhow!("The fallback label must not be empty."));
        }
        let fallback = CategorizationRule::new(MATCH_ANYTHING, fallback_label, None)?;
        Ok(RuleSet { rules, fallback })
    }

    /// The rules used for Colombian bank statements when none are configured.
    pub fn colombian_defaults() -> Self {
        RuleSet {
            rules: colombian_rules(),
            fallback: CategorizationRule::new(MATCH_ANYTHING, FALLBACK_LABEL, None)
                .expect("the fallback pattern is valid"),
        }
    }

    /// Give the description the label of the first rule it matches.
    pub fn classify(&self, description: &str) -> Categorization {
        let rule = self
            .iter()
            .find(|rule| rule.matches(description))
            .unwrap_or(&self.fallback);
        Categorization {
            label: rule.label().to_owned(),
            account: rule.account().map(str::to_owned),
        }
    }

    /// All rules in evaluation order, the fallback last.
    pub fn iter(&self) -> impl Iterator<Item = &CategorizationRule> {
        self.rules.iter().chain(iter::once(&self.fallback))
    }

    /// The number of rules, not counting the fallback.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn defaults() -> RuleSet {
        RuleSet::colombian_defaults()
    }

    fn categorization(label: &str, account: Option<&str>) -> Categorization {
        Categorization {
            label: label.to_string(),
            account: account.map(str::to_owned),
        }
    }

    #[rstest]
    #[case("PAGO NOMINA QUINCENA", "Nómina", Some("510506"))]
    #[case("pago de nómina empleados", "Nómina", Some("510506"))]
    #[case("TRANSF NOMINA 000123456789", "Nómina", Some("510506"))]
    #[case("Nomina Consignacion Abono", "Nómina", Some("510506"))]
    #[case("GMF 4X1000", "Gravamen movimientos financieros", Some("530595"))]
    #[case("IMPTO GOBIERNO 4x1000", "Gravamen movimientos financieros", Some("530595"))]
    #[case("RETEFUENTE SERVICIOS", "Retención en la fuente", Some("135515"))]
    #[case("COBRO IVA COMISION", "IVA", Some("240810"))]
    #[case("PAGO DIAN F490", "Impuestos", Some("240405"))]
    #[case("CUOTA DE MANEJO TARJETA", "Gastos bancarios", Some("530505"))]
    #[case("ABONO INTERESES AHORROS", "Rendimientos financieros", Some("421005"))]
    #[case("PAGO ARRIENDO LOCAL", "Arrendamientos", Some("512010"))]
    #[case("PAGO PSE EPM", "Servicios públicos", Some("513525"))]
    #[case("PAGO PSE FERRETERIA", "Proveedores", Some("220505"))]
    #[case("TRANSFERENCIA A CTA 123456", "Transferencias", Some("111005"))]
    #[case("CONSIGNACION NACIONAL", "Consignaciones", Some("130505"))]
    #[case("Compra varios", FALLBACK_LABEL, None)]
    #[case("", FALLBACK_LABEL, None)]
    fn test_classify_with_defaults(
        defaults: RuleSet,
        #[case] description: &str,
        #[case] label: &str,
        #[case] account: Option<&str>,
    ) {
        assert_eq!(
            defaults.classify(description),
            categorization(label, account)
        );
    }

    #[test]
    fn test_rule_position_decides() {
        let nomina = CategorizationRule::new("NOMINA", "Nómina", Some("510506")).unwrap();
        let transfer = CategorizationRule::new("TRANSF", "Transferencias", None).unwrap();
        let description = "TRANSF NOMINA MARZO";

        let specific_first = RuleSet::new(vec![nomina.clone(), transfer.clone()]).unwrap();
        let general_first = RuleSet::new(vec![transfer, nomina]).unwrap();

        assert_eq!(
            specific_first.classify(description),
            categorization("Nómina", Some("510506"))
        );
        assert_eq!(
            general_first.classify(description),
            categorization("Transferencias", None)
        );
        // Repeating gives the same answer.
        assert_eq!(
            general_first.classify(description),
            general_first.classify(description)
        );
    }

    #[test]
    fn test_empty_rule_set_still_categorizes() {
        let rules = RuleSet::new(vec![]).unwrap();
        assert!(rules.is_empty());
        assert_eq!(rules.classify("anything"), categorization(FALLBACK_LABEL, None));
    }

    #[test]
    fn test_custom_fallback() {
        let rules = RuleSet::with_fallback(vec![], "Sin imputar").unwrap();
        assert_eq!(rules.classify("x"), categorization("Sin imputar", None));
        assert!(RuleSet::with_fallback(vec![], "  ").is_err());
    }

    #[test]
    fn test_fallback_is_last() {
        let rules = RuleSet::colombian_defaults();
        assert_eq!(rules.iter().count(), rules.len() + 1);
        assert_eq!(rules.iter().last().unwrap().label(), FALLBACK_LABEL);
    }
}
