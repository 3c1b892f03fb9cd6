//! Canonical column names and the fixed lookup tables used to clean the two exports.
//!
//! The lead export is renamed into lowercase canonical names. The spend export
//! keeps its original capitalised Portuguese names and only gains `date` and
//! `amount_spent`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Lead table (canonical)
pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const CREATED_AT: &str = "created_at";
pub const CPF: &str = "cpf";
pub const PHONE: &str = "phone";
pub const COVENANT: &str = "covenant";
pub const COVENANT_ACRONYM: &str = "covenant_acronym";
pub const ORIGIN: &str = "origin";
pub const CAMPAIGN_TAG: &str = "campaign_tag";
pub const ORIGINAL_OWNER: &str = "original_owner";
pub const PRODUCT: &str = "product";
pub const TEAM: &str = "team";
pub const STAGE: &str = "stage";
pub const LOSS_REASON: &str = "loss_reason";
pub const LOSS_REASON_GROUPED: &str = "loss_reason_grouped";
pub const LOSS_DETAIL: &str = "loss_detail";
pub const COMMISSION_PROJECTED: &str = "commission_projected";
pub const COMMISSION_GENERATED: &str = "commission_generated";
pub const COMMISSION_PAID: &str = "commission_paid";
pub const OWNER: &str = "owner";
pub const DATE: &str = "date";
pub const TIME_CREATED: &str = "time_created";
pub const DATE_LEAD: &str = "date_lead";
pub const DATE_NEGOTIATION: &str = "date_negotiation";
pub const DATE_CONTRACTING: &str = "date_contracting";
pub const DATE_PAID: &str = "date_paid";
pub const DATE_LOST: &str = "date_lost";

// Spend table (original names + derived)
pub const SPEND_RAW_DATE: &str = "Data";
pub const SPEND_CHANNEL: &str = "Canal";
pub const SPEND_QUANTITY: &str = "Quantidade";
pub const SPEND_COVENANT: &str = "Convênio";
pub const SPEND_PRODUCT: &str = "Produto";
pub const SPEND_TEAM: &str = "Equipe";
pub const AMOUNT_SPENT: &str = "amount_spent";

/// `stage` value of deals whose commission has been paid out.
pub const PAID_STAGE: &str = "PAGO";

/// Replacement for loss reasons outside [`MAIN_LOSS_REASONS`].
pub const OTHER_LOSS_REASON: &str = "Outros";

/// Series name of the per-day total in the channel time series.
pub const TOTAL_SERIES: &str = "Total Geral";

/// Source column name → canonical name for the CRM export.
pub const LEAD_RENAMES: &[(&str, &str)] = &[
    ("ID do registro.", ID),
    ("Nome do negócio", NAME),
    ("Data de criação", CREATED_AT),
    ("CPF", CPF),
    ("Telefone", PHONE),
    ("Convênio", COVENANT),
    ("Origem", ORIGIN),
    ("Campanha", CAMPAIGN_TAG),
    ("Proprietário original do negócio", ORIGINAL_OWNER),
    ("Tipo de Campanha", PRODUCT),
    ("Equipe da HubSpot", TEAM),
    ("Etapa do negócio", STAGE),
    ("Motivo de fechamento perdido", LOSS_REASON),
    ("Comissão total projetada", COMMISSION_PROJECTED),
    ("Valor", COMMISSION_GENERATED),
    ("Proprietário do negócio", OWNER),
    (
        "Date entered \"CONTRATAÇÃO ( Pipeline de Vendas)\"",
        DATE_CONTRACTING,
    ),
    ("Date entered \"LEAD ( Pipeline de Vendas)\"", DATE_LEAD),
    (
        "Date entered \"NEGOCIAÇÃO ( Pipeline de Vendas)\"",
        DATE_NEGOTIATION,
    ),
    ("Date entered \"PAGO ( Pipeline de Vendas)\"", DATE_PAID),
    ("Date entered \"PERDA ( Pipeline de Vendas)\"", DATE_LOST),
    ("Detalhes do motivo de perda", LOSS_DETAIL),
    ("Comissão Konsigleads", COMMISSION_PAID),
];

/// Canonical lead columns without which no metric can be computed.
pub const REQUIRED_LEAD_COLUMNS: &[&str] =
    &[ID, CREATED_AT, COVENANT, ORIGIN, PRODUCT, TEAM, STAGE];

pub const REQUIRED_SPEND_COLUMNS: &[&str] = &[
    SPEND_RAW_DATE,
    SPEND_CHANNEL,
    SPEND_QUANTITY,
    SPEND_COVENANT,
    SPEND_PRODUCT,
    SPEND_TEAM,
];

/// Stage-entry timestamps, all reduced to calendar dates.
pub const STAGE_DATE_COLUMNS: &[&str] = &[
    DATE_LEAD,
    DATE_NEGOTIATION,
    DATE_CONTRACTING,
    DATE_PAID,
    DATE_LOST,
];

pub const MONEY_COLUMNS: &[&str] = &[
    COMMISSION_PROJECTED,
    COMMISSION_GENERATED,
    COMMISSION_PAID,
];

/// Categorical lead columns coerced to strings.
pub const LEAD_TEXT_COLUMNS: &[&str] = &[
    NAME,
    CPF,
    PHONE,
    COVENANT,
    ORIGIN,
    CAMPAIGN_TAG,
    ORIGINAL_OWNER,
    PRODUCT,
    TEAM,
    STAGE,
    LOSS_REASON,
    OWNER,
    LOSS_DETAIL,
];

pub const SPEND_TEXT_COLUMNS: &[&str] = &[SPEND_CHANNEL, SPEND_COVENANT, SPEND_PRODUCT, SPEND_TEAM];

/// Loss reasons reported individually; everything else collapses into [`OTHER_LOSS_REASON`].
pub const MAIN_LOSS_REASONS: &[&str] = &[
    "Sem Interação",
    "Telefone Inválido",
    "Sem interesse",
    "Sem oportunidade",
    "Lead respondeu \"NÃO\" ao disparo",
    "Vínculo inadequado",
    "Desistência do Cliente",
    "Sem interação; Sem interesse",
    "Não atende",
    "Não receber mensagens - LGPD",
    "Margem Insuficiente",
];

/// Lowercased covenant name → display acronym.
pub const COVENANT_ACRONYMS: &[(&str, &str)] = &[
    ("prefeitura de recife", "PREF REC"),
    ("prefeitura de curitiba", "PREF CUR"),
    ("prefeitura de maringá", "PREF MAR"),
    ("prefeitura de goiânia", "PREF GOI"),
    ("prefeitura de belo horizonte", "PREF BH"),
    ("governo de rondônia", "GOV RO"),
    ("governo do paraná", "GOV PR"),
    ("prefeitura de são paulo", "PREF SP"),
    ("governo de são paulo", "GOV SP"),
    ("prefeitura do rio de janeiro", "PREF RJ"),
    ("governo do rio de janeiro", "GOV RJ"),
    ("prefeitura de salvador", "PREF SSA"),
    ("governo da bahia", "GOV BA"),
    ("governo de alagoas", "GOV AL"),
    ("governo do amazonas", "GOV AM"),
    ("governo do maranhão", "GOV MA"),
    ("governo de goiás", "GOV GO"),
    ("governo do ceará", "GOV CE"),
    ("governo de pernambuco", "GOV PE"),
    ("governo de mato grosso do sul", "GOV MS"),
    ("governo de mato grosso", "GOV MT"),
    ("governo do piauí", "GOV PI"),
    ("prefeitura de joão pessoa", "PREF JP"),
    ("governo de minas gerais", "GOV MG"),
    ("governo de santa catarina", "GOV SC"),
    ("inss", "INSS"),
    ("siape", "SIAPE"),
    ("tribunal de justiça de são paulo (tjsp)", "TJSP"),
    ("governo do espírito santo", "GOV ES"),
    ("marinha", "Marinha"),
    ("iniciativa privada", "CLT"),
];

/// Ordered (pattern, replacement) rules for team names. Patterns match
/// case-insensitively as substrings of the running value.
pub const TEAM_RULES: &[(&str, &str)] = &[
    ("Cs Cp", "Cs Cp"),
    ("Cs Port", "Cs Port"),
    ("Sales app", "Esteira"),
    ("Sales", "Sales"),
    ("Cs Ativação", "Cs Ativacao"),
    ("Cs App", "Cs App"),
];

/// Teams whose deals always belong to a fixed product.
pub const TEAM_PRODUCT_OVERRIDES: &[(&str, &str)] =
    &[("Cs Cdx", "CDX"), ("Cs Cp", "CP"), ("Cs Port", "Port")];

/// (origin, team, canonical channel) remaps.
pub const ORIGIN_REMAPS: &[(&str, &str, &str)] = &[
    ("HYPERFLOW", "Sales", "RCS"),
    ("Duplicação Negócio App", "Sales", "Duplicacao"),
    ("Duplicação", "Sales", "Duplicacao"),
];

/// Per-send cost used when normalizing the spend export.
pub const SPEND_UNIT_COSTS: &[(&str, f64)] = &[
    ("SMS", 0.047),
    ("RCS", 0.105),
    ("HYPERFLOW", 0.04672),
    ("Whatsapp", 0.04672),
];

/// Per-send cost used for the "total spend" KPI.
pub const KPI_UNIT_COSTS: &[(&str, f64)] = &[
    ("SMS", 0.048),
    ("RCS", 0.105),
    ("HYPERFLOW", 0.047),
    ("Whatsapp", 0.046),
];

/// Per-send cost used by the per-10k-sends estimate.
pub const SENDS_UNIT_COSTS: &[(&str, f64)] = &[("RCS", 0.105), ("SMS", 0.047)];

/// Channel name → cost of one send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCostTable(BTreeMap<String, f64>);

impl UnitCostTable {
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(channel, cost)| ((*channel).to_owned(), *cost))
                .collect(),
        )
    }

    pub fn get(&self, channel: &str) -> Option<f64> {
        self.0.get(channel).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(channel, cost)| (channel.as_str(), *cost))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The three unit-cost tables. They are deliberately kept apart: the exports
/// were priced differently depending on which figure was being reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// Prices `amount_spent` on every spend row.
    pub spend: UnitCostTable,
    /// Prices the total-spend KPI.
    pub kpi: UnitCostTable,
    /// Prices the per-10k-sends estimate.
    pub sends: UnitCostTable,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            spend: UnitCostTable::from_pairs(SPEND_UNIT_COSTS),
            kpi: UnitCostTable::from_pairs(KPI_UNIT_COSTS),
            sends: UnitCostTable::from_pairs(SENDS_UNIT_COSTS),
        }
    }
}
